//! Answer correctness decisions.
//!
//! Choice questions are settled locally through option identity. Free-text
//! questions go to an [`EquivalenceOracle`] when one is configured; an
//! oracle that errors, answers with anything but a clean verdict, or is not
//! configured at all is treated as unavailable and the judge falls back to
//! normalized text equality.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::model::Question;
use crate::normalize::normalized_eq;
use crate::options::{derive_correct_index, resolve_selection};
use crate::traits::{CompletionRequest, EquivalenceOracle, EquivalenceRequest, LlmProvider};

/// System prompt for LLM-backed equivalence checks.
pub const ORACLE_SYSTEM_PROMPT: &str = "You are an answer evaluation assistant. Compare the user's answer with the correct answer and determine if they convey the same meaning, even if worded differently. Respond with only 'YES' if the meanings match or are very similar, or 'NO' if they are different.";

/// A clean oracle verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Equivalent,
    Different,
}

impl Verdict {
    /// Parse a raw oracle token. Only `YES` and `NO` (trimmed,
    /// case-insensitive) are verdicts; anything else is `None`.
    ///
    /// A clean `NO` is final: the judge does not fall back to text matching
    /// for it, only for `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.trim();
        if token.eq_ignore_ascii_case("yes") {
            Some(Verdict::Equivalent)
        } else if token.eq_ignore_ascii_case("no") {
            Some(Verdict::Different)
        } else {
            None
        }
    }
}

/// Decides whether a learner's answer matches a question's intended answer.
#[derive(Clone, Default)]
pub struct EquivalenceJudge {
    oracle: Option<Arc<dyn EquivalenceOracle>>,
}

impl EquivalenceJudge {
    pub fn new(oracle: Arc<dyn EquivalenceOracle>) -> Self {
        Self {
            oracle: Some(oracle),
        }
    }

    /// A judge with no oracle; free-text answers use exact normalized
    /// comparison only.
    pub fn offline() -> Self {
        Self { oracle: None }
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Returns whether `raw_answer` is a correct answer to `question`.
    ///
    /// Never fails: every unavailable path degrades to text comparison.
    pub async fn is_equivalent(&self, question: &Question, raw_answer: &str) -> bool {
        if question.kind.is_free_text() {
            self.free_text_equivalent(question, raw_answer).await
        } else {
            choice_equivalent(question, raw_answer)
        }
    }

    #[instrument(skip_all, fields(kind = %question.kind))]
    async fn free_text_equivalent(&self, question: &Question, raw_answer: &str) -> bool {
        let candidate = raw_answer.trim();
        let reference = question.reference_answer.trim();

        let Some(oracle) = &self.oracle else {
            return normalized_eq(candidate, reference);
        };

        let request = EquivalenceRequest {
            reference_answer: reference.to_string(),
            candidate_answer: candidate.to_string(),
        };

        match oracle.judge(&request).await {
            Ok(raw) => match Verdict::parse(&raw) {
                Some(verdict) => verdict == Verdict::Equivalent,
                None => {
                    tracing::warn!(
                        "oracle returned unrecognised verdict {raw:?}, using text comparison"
                    );
                    normalized_eq(candidate, reference)
                }
            },
            Err(e) => {
                tracing::warn!("oracle unavailable, using text comparison: {e:#}");
                normalized_eq(candidate, reference)
            }
        }
    }
}

/// Correctness of a choice question, decided by option identity.
///
/// Never consults an oracle.
pub fn choice_equivalent(question: &Question, raw_answer: &str) -> bool {
    let answer = raw_answer.trim();
    let reference = question.reference_answer.trim();

    if question.options.is_empty() {
        return normalized_eq(answer, reference);
    }

    let selected = resolve_selection(question, answer).index();
    let correct = derive_correct_index(question).index();

    match (selected, correct) {
        (Some(s), Some(c)) => s == c,
        (Some(s), None) => normalized_eq(&question.options[s], reference),
        _ => normalized_eq(answer, reference),
    }
}

// ---------------------------------------------------------------------------
// LLM-backed oracle
// ---------------------------------------------------------------------------

/// An [`EquivalenceOracle`] that asks a chat-completion model for a YES/NO
/// verdict.
pub struct LlmOracle {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl LlmOracle {
    pub fn new(provider: Arc<dyn LlmProvider>, model: &str) -> Self {
        Self {
            provider,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl EquivalenceOracle for LlmOracle {
    async fn judge(&self, request: &EquivalenceRequest) -> anyhow::Result<String> {
        let completion = CompletionRequest {
            model: self.model.clone(),
            system_prompt: ORACLE_SYSTEM_PROMPT.to_string(),
            prompt: format!(
                "User's Answer: \"{}\"\n\nCorrect Answer: \"{}\"\n\nDo these answers have the same meaning?",
                request.candidate_answer, request.reference_answer
            ),
            max_tokens: 8,
            temperature: 0.0,
        };
        let response = self.provider.complete(&completion).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::traits::CompletionResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Oracle double that replays a fixed reply and counts calls.
    struct ScriptedOracle {
        reply: Result<String, String>,
        calls: AtomicUsize,
    }

    impl ScriptedOracle {
        fn answering(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(error: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(error.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EquivalenceOracle for ScriptedOracle {
        async fn judge(&self, _request: &EquivalenceRequest) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(ProviderError::NetworkError(e.clone()).into()),
            }
        }
    }

    fn colours(reference: &str) -> Question {
        Question::choice("Pick a colour", &["Red", "Green", "Blue", "Yellow"], reference)
    }

    #[test]
    fn verdict_parsing_is_strict() {
        assert_eq!(Verdict::parse("YES"), Some(Verdict::Equivalent));
        assert_eq!(Verdict::parse(" yes\n"), Some(Verdict::Equivalent));
        assert_eq!(Verdict::parse("No"), Some(Verdict::Different));
        assert_eq!(Verdict::parse("YES."), None);
        assert_eq!(Verdict::parse("Yes, they match"), None);
        assert_eq!(Verdict::parse(""), None);
    }

    #[tokio::test]
    async fn choice_letter_against_text_reference() {
        let judge = EquivalenceJudge::offline();
        let q = colours("Green");
        assert!(judge.is_equivalent(&q, "B").await);
        assert!(!judge.is_equivalent(&q, "C").await);
    }

    #[tokio::test]
    async fn choice_full_text_answer_matches_by_identity() {
        let judge = EquivalenceJudge::offline();
        let q = colours("B");
        assert!(judge.is_equivalent(&q, "green").await);
        assert!(!judge.is_equivalent(&q, "Blue").await);
    }

    #[tokio::test]
    async fn choice_questions_never_consult_the_oracle() {
        let oracle = ScriptedOracle::answering("YES");
        let judge = EquivalenceJudge::new(oracle.clone());
        let q = colours("A");
        assert!(!judge.is_equivalent(&q, "D").await);
        assert!(judge.is_equivalent(&q, "a").await);
        assert!(!judge.is_equivalent(&q, "nonsense").await);
        assert_eq!(oracle.calls(), 0);
    }

    #[test]
    fn choice_with_unresolved_reference_compares_option_text() {
        let q = Question::choice("Pick", &["one", "two"], "42 apples");
        assert!(!choice_equivalent(&q, "A"));

        assert!(
            choice_equivalent(&q, "42 Apples!"),
            "unresolved on both sides falls back to raw text"
        );
    }

    #[test]
    fn choice_without_options_uses_text_equality() {
        let q = Question::choice("Pick", &[], "Mercury");
        assert!(choice_equivalent(&q, "mercury"));
        assert!(!choice_equivalent(&q, "Venus"));
    }

    #[tokio::test]
    async fn free_text_follows_oracle_verdict() {
        let yes = EquivalenceJudge::new(ScriptedOracle::answering("yes"));
        let no = EquivalenceJudge::new(ScriptedOracle::answering("NO"));
        let q = Question::long_answer("What do mitochondria do?", "Mitochondria produce energy");

        assert!(yes.is_equivalent(&q, "they make ATP for the cell").await);
        assert!(!no.is_equivalent(&q, "the powerhouse of the cell").await);
        // A clean NO beats an exact text match.
        assert!(!no.is_equivalent(&q, "Mitochondria produce energy").await);
    }

    #[tokio::test]
    async fn oracle_failure_falls_back_to_normalized_equality() {
        let oracle = ScriptedOracle::failing("connection refused");
        let judge = EquivalenceJudge::new(oracle.clone());
        let q = Question::short_answer("Capital of France?", "Paris");

        assert!(judge.is_equivalent(&q, "paris").await);
        assert!(!judge.is_equivalent(&q, "Lyon").await);
        assert_eq!(oracle.calls(), 2);
    }

    #[tokio::test]
    async fn malformed_verdict_falls_back_to_normalized_equality() {
        let judge = EquivalenceJudge::new(ScriptedOracle::answering("I think so"));
        let q = Question::short_answer("Capital of France?", "Paris");
        assert!(judge.is_equivalent(&q, " PARIS ").await);
        assert!(!judge.is_equivalent(&q, "the capital").await);
    }

    #[tokio::test]
    async fn offline_judge_matches_normalized_text() {
        let judge = EquivalenceJudge::offline();
        assert!(!judge.has_oracle());
        let q = Question::short_answer("Capital of France?", "Paris");
        assert!(judge.is_equivalent(&q, "paris.").await);
    }

    /// Provider double recording the last request.
    struct RecordingProvider {
        reply: String,
        last: Mutex<Option<CompletionRequest>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
            *self.last.lock().unwrap() = Some(request.clone());
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                latency_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn llm_oracle_builds_strict_prompt() {
        let provider = Arc::new(RecordingProvider {
            reply: "YES".into(),
            last: Mutex::new(None),
        });
        let oracle = LlmOracle::new(provider.clone(), "deepseek/deepseek-chat");
        let verdict = oracle
            .judge(&EquivalenceRequest {
                reference_answer: "Paris".into(),
                candidate_answer: "paris".into(),
            })
            .await
            .unwrap();
        assert_eq!(verdict, "YES");

        let request = provider.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.model, "deepseek/deepseek-chat");
        assert_eq!(request.system_prompt, ORACLE_SYSTEM_PROMPT);
        assert!(request.prompt.contains("Correct Answer: \"Paris\""));
        assert!(request.prompt.contains("User's Answer: \"paris\""));
    }
}
