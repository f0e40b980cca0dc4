//! Mock provider for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use studybuddy_core::traits::{CompletionRequest, CompletionResponse, LlmProvider};

use crate::error::ProviderError;

/// What the mock does for one call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Fail the call with a network error carrying this message.
    Fail(String),
}

/// A mock LLM provider for exercising quiz generation and grading without
/// real API calls.
///
/// Replies are taken from a queue first, then from prompt-substring rules,
/// then the default reply.
pub struct MockProvider {
    queue: Mutex<VecDeque<MockReply>>,
    rules: Vec<(String, MockReply)>,
    default_reply: MockReply,
    call_count: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockProvider {
    /// A mock that always answers with `reply`.
    pub fn with_fixed_response(reply: &str) -> Self {
        Self::with_default(MockReply::Text(reply.to_string()))
    }

    /// A mock whose every call fails.
    pub fn failing(message: &str) -> Self {
        Self::with_default(MockReply::Fail(message.to_string()))
    }

    fn with_default(default_reply: MockReply) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            rules: Vec::new(),
            default_reply,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Queue replies to be returned, in order, before any rule applies.
    pub fn with_script(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        self.queue.lock().unwrap().extend(replies);
        self
    }

    /// Answer `reply` whenever the user prompt contains `needle`.
    pub fn when_prompt_contains(mut self, needle: &str, reply: MockReply) -> Self {
        self.rules.push((needle.to_string(), reply));
        self
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &CompletionRequest) -> MockReply {
        if let Some(reply) = self.queue.lock().unwrap().pop_front() {
            return reply;
        }
        self.rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_reply.clone())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match self.next_reply(request) {
            MockReply::Text(content) => Ok(CompletionResponse {
                content,
                model: request.model.clone(),
                latency_ms: 1,
            }),
            MockReply::Fail(message) => Err(ProviderError::NetworkError(message).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: "mock".into(),
            system_prompt: String::new(),
            prompt: prompt.into(),
            max_tokens: 8,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("YES");
        let response = provider.complete(&request("anything")).await.unwrap();
        assert_eq!(response.content, "YES");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn script_then_rules_then_default() {
        let provider = MockProvider::with_fixed_response("NO")
            .with_script([MockReply::Text("first".into()), MockReply::Fail("down".into())])
            .when_prompt_contains("Paris", MockReply::Text("YES".into()));

        assert_eq!(provider.complete(&request("x")).await.unwrap().content, "first");
        assert!(provider.complete(&request("x")).await.is_err());
        assert_eq!(provider.complete(&request("Paris?")).await.unwrap().content, "YES");
        assert_eq!(provider.complete(&request("Lyon?")).await.unwrap().content, "NO");
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn failing_mock_reports_network_error() {
        let provider = MockProvider::failing("connection refused");
        let err = provider.complete(&request("x")).await.unwrap_err();
        assert_eq!(err.to_string(), "network error: connection refused");
    }
}
