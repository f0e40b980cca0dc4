//! Error types shared across the studybuddy crates.
//!
//! `ProviderError` lives here rather than in `studybuddy-providers` so the
//! judge and the question generator can classify failures without string
//! matching.

use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key was configured for the provider.
    #[error("missing credential for provider '{0}'")]
    MissingCredential(String),

    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response body could not be understood.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and retrying cannot help.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::MissingCredential(_)
                | ProviderError::AuthenticationFailed(_)
                | ProviderError::ModelNotFound(_)
        )
    }
}

/// Rejected quiz state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// The learner tried to advance without answering.
    #[error("Please provide an answer")]
    EmptyAnswer { index: usize },

    /// The requested action is not valid in the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// A failure of a whole evaluation batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("answer sheet has {answers} slots for {questions} questions")]
    CountMismatch { questions: usize, answers: usize },

    #[error("no result produced for question {0}")]
    MissingResult(usize),

    #[error("evaluation worker pool closed")]
    PoolClosed,
}

/// Errors from the study session aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("complete at least one quiz before ending session")]
    NoQuizzes,

    #[error("session end is before its start")]
    InvalidTimeRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_provider_errors() {
        assert!(ProviderError::MissingCredential("openai".into()).is_permanent());
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(!ProviderError::RateLimited { retry_after_ms: 10 }.is_permanent());
        assert!(!ProviderError::NetworkError("reset".into()).is_permanent());
    }

    #[test]
    fn quiz_error_messages() {
        assert_eq!(
            QuizError::EmptyAnswer { index: 2 }.to_string(),
            "Please provide an answer"
        );
        let err = QuizError::InvalidTransition {
            action: "retry",
            state: "answering",
        };
        assert_eq!(err.to_string(), "cannot retry while answering");
    }
}
