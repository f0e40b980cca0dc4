//! studybuddy-providers: chat-completion backends.
//!
//! Implements the `LlmProvider` trait for OpenAI-compatible endpoints
//! (OpenRouter by default) and Anthropic, plus a scripted mock for tests.

pub mod anthropic;
pub mod config;
pub mod error;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, load_config_from, ProviderConfig, StudybuddyConfig};
pub use error::ProviderError;
