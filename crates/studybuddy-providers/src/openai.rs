//! OpenAI-compatible chat completions provider.
//!
//! Defaults to OpenRouter, which serves many model families behind the
//! same `/v1/chat/completions` endpoint.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use studybuddy_core::traits::{CompletionRequest, CompletionResponse, LlmProvider};

use crate::error::{check_status, transport_error, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const APP_TITLE: &str = "Study Buddy";

/// OpenAI-compatible API provider.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredential(self.name().to_string()).into());
        }
        let start = Instant::now();

        let body = ChatRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .header("X-Title", APP_TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, DEFAULT_TIMEOUT_SECS))?;
        let response = check_status(response, &request.model).await?;

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("response has no choices".into()))?;

        Ok(CompletionResponse {
            content,
            model: api_response.model.unwrap_or_else(|| request.model.clone()),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.into(),
            system_prompt: "Answer YES or NO.".into(),
            prompt: "Do these match?".into(),
            max_tokens: 8,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn successful_completion() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "choices": [{"message": {"content": "YES", "role": "assistant"}, "index": 0}],
            "model": "deepseek/deepseek-chat"
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek/deepseek-chat",
                "messages": [
                    {"role": "system", "content": "Answer YES or NO."},
                    {"role": "user", "content": "Do these match?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new("test-key", Some(format!("{}/", server.uri())));
        let response = provider
            .complete(&request("deepseek/deepseek-chat"))
            .await
            .unwrap();
        assert_eq!(response.content, "YES");
        assert_eq!(response.model, "deepseek/deepseek-chat");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new("", Some(server.uri()));
        let err = provider.complete(&request("m")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::MissingCredential(_))
        ));
    }

    #[tokio::test]
    async fn error_message_is_extracted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": {"message": "upstream overloaded"}
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new("key", Some(server.uri()));
        let err = provider.complete(&request("m")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "API error (HTTP 500): upstream overloaded"
        );
    }

    #[tokio::test]
    async fn unknown_model_is_classified() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such model"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new("key", Some(server.uri()));
        let err = provider.complete(&request("nope/model")).await.unwrap_err();
        let err = err.downcast::<ProviderError>().unwrap();
        assert!(err.is_permanent());
        assert_eq!(err.to_string(), "model not found: nope/model");
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new("key", Some(server.uri()));
        let err = provider.complete(&request("m")).await.unwrap_err();
        assert!(err.to_string().starts_with("malformed response"));
    }
}
