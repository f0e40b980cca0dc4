//! studybuddy-core: answer evaluation, quiz flow and study-session data.
//!
//! This crate holds the data model, the option resolver and equivalence
//! judge, the quiz state machine with its bulk evaluation engine, and the
//! session aggregate the report renderer consumes.

pub mod engine;
pub mod error;
pub mod generator;
pub mod judge;
pub mod model;
pub mod normalize;
pub mod options;
pub mod parser;
pub mod quiz;
pub mod session;
pub mod statistics;
pub mod traits;
