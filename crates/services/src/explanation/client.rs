use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::ExplanationConfig;
use crate::error::CompletionError;

/// One chat-completion call: system instruction, user prompt, and whether a
/// strict JSON object is requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub json_object: bool,
}

/// The external call boundary used to generate explanations.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion and return the raw response text.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError` on transport, status, or empty-body failures.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    config: Option<ExplanationConfig>,
}

impl ChatCompletionClient {
    /// A client with no configuration answers every call with `Disabled`.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::Http` if the HTTP client cannot be built.
    pub fn new(config: Option<ExplanationConfig>) -> Result<Self, CompletionError> {
        let mut builder = Client::builder();
        if let Some(config) = &config {
            builder = builder.timeout(config.timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    #[instrument(skip_all, fields(model = tracing::field::Empty))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let config = self.config.as_ref().ok_or(CompletionError::Disabled)?;
        tracing::Span::current().record("model", config.model.as_str());

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt.clone(),
                },
            ],
            response_format: request
                .json_object
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CompletionError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> ExplanationConfig {
        ExplanationConfig {
            base_url,
            api_key: "test-key".into(),
            model: "test-model".into(),
            timeout: Duration::from_secs(5),
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "be helpful".into(),
            prompt: "explain".into(),
            json_object: true,
        }
    }

    #[tokio::test]
    async fn posts_json_object_request() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": " {\"answer\":\"A\"} "}, "index": 0}]
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "response_format": {"type": "json_object"},
                "messages": [
                    {"role": "system", "content": "be helpful"},
                    {"role": "user", "content": "explain"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(Some(config(format!("{}/v1/", server.uri())))).unwrap();
        let text = client.complete(&request()).await.unwrap();
        assert_eq!(text, " {\"answer\":\"A\"} ");
    }

    #[tokio::test]
    async fn reply_whitespace_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  plain answer\n"}}]
            })))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(Some(config(format!("{}/v1", server.uri())))).unwrap();
        let text = client.complete(&request()).await.unwrap();
        assert_eq!(text, "  plain answer\n");
    }

    #[tokio::test]
    async fn whitespace_only_reply_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": " \n "}}]
            })))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(Some(config(format!("{}/v1", server.uri())))).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::EmptyResponse));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(Some(config(format!("{}/v1", server.uri())))).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::HttpStatus(s) if s.as_u16() == 500));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(Some(config(format!("{}/v1", server.uri())))).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::EmptyResponse));
    }

    #[tokio::test]
    async fn unconfigured_client_is_disabled() {
        let client = ChatCompletionClient::new(None).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Disabled));
    }
}
