pub mod init;
pub mod quiz;
pub mod report;
pub mod validate;
