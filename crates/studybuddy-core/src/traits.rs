//! Core trait definitions for the collaborators the quiz engine talks to.
//!
//! `LlmProvider` is implemented by the `studybuddy-providers` crate;
//! `EquivalenceOracle` and `QuestionSource` have LLM-backed implementations
//! in [`crate::judge`] and [`crate::generator`] and can be swapped for test
//! doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::generator::QuizConfig;
use crate::model::Question;

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for chat-completion backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Send one system + user exchange and return the assistant's text.
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse>;
}

/// A single chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g. "deepseek/deepseek-chat").
    pub model: String,
    /// System instructions.
    pub system_prompt: String,
    /// The user turn.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The assistant's text.
    pub content: String,
    /// Model that actually answered.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Semantic-equivalence oracle
// ---------------------------------------------------------------------------

/// A request to decide whether two answers mean the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceRequest {
    pub reference_answer: String,
    pub candidate_answer: String,
}

/// External judge of semantic equivalence.
///
/// Returns the raw verdict token; interpretation (and the fallback when the
/// token is anything other than a clean yes/no) belongs to
/// [`crate::judge::EquivalenceJudge`].
#[async_trait]
pub trait EquivalenceOracle: Send + Sync {
    async fn judge(&self, request: &EquivalenceRequest) -> anyhow::Result<String>;
}

// ---------------------------------------------------------------------------
// Question source
// ---------------------------------------------------------------------------

/// Supplies an ordered question set on demand.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn questions(&self, config: &QuizConfig) -> anyhow::Result<Vec<Question>>;
}
