//! # Completion Client Module
//!
//! Request/response client for the text generation endpoint. The model is
//! prompted with the user's message and its first alternative is returned.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::ApiError;

pub const COMPLETION_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";
pub const SYSTEM_PREAMBLE: &str = "You are a helpful assistant";
pub const TEMPERATURE: f64 = 0.6;
pub const MAX_TOKENS: u32 = 2000;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Placeholder returned when the response has no usable text
pub const MISSING_TEXT_PLACEHOLDER: &str = "Could not extract text from the response";

/// Outcome tag of a completion call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Success,
    Error,
}

/// Text returned by the completion endpoint
///
/// A call can succeed at the HTTP level and still carry
/// [`CompletionStatus::Error`] when the body lacks the expected fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub response: String,
    pub status: CompletionStatus,
}

impl CompletionResult {
    pub fn is_success(&self) -> bool {
        self.status == CompletionStatus::Success
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    text: &'a str,
}

/// Client for the completion endpoint
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    catalog_id: String,
    endpoint: String,
}

impl CompletionClient {
    pub fn new(api_key: impl Into<String>, catalog_id: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            catalog_id: catalog_id.into(),
            endpoint: COMPLETION_URL.to_string(),
        })
    }

    /// Point the client at another completion endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Ask the model to answer `user_message`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] on a non-success status and
    /// [`ApiError::Network`] on connection failures, timeouts or a body that
    /// is not JSON. A JSON body without text is *not* an error: check
    /// [`CompletionResult::status`].
    pub async fn generate(&self, user_message: &str) -> Result<CompletionResult, ApiError> {
        let request = build_request(&self.catalog_id, user_message);
        debug!(model_uri = %request.model_uri, "Sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Completion endpoint returned an error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        let body: Value = response.json().await?;
        Ok(parse_completion_body(&body))
    }
}

fn build_request<'a>(catalog_id: &str, user_message: &'a str) -> CompletionRequest<'a> {
    CompletionRequest {
        model_uri: format!("gpt://{catalog_id}/yandexgpt/latest"),
        completion_options: CompletionOptions {
            stream: false,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        },
        messages: vec![
            ChatMessage {
                role: "system",
                text: SYSTEM_PREAMBLE,
            },
            ChatMessage {
                role: "user",
                text: user_message,
            },
        ],
    }
}

/// Pull `result.alternatives[0].message.text` out of a response body
pub fn parse_completion_body(body: &Value) -> CompletionResult {
    match body
        .pointer("/result/alternatives/0/message/text")
        .and_then(Value::as_str)
    {
        Some(text) => CompletionResult {
            response: text.to_string(),
            status: CompletionStatus::Success,
        },
        None => CompletionResult {
            response: MISSING_TEXT_PLACEHOLDER.to_string(),
            status: CompletionStatus::Error,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = build_request("b1gcatalog", "Tell me about courage");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["modelUri"], "gpt://b1gcatalog/yandexgpt/latest");
        assert_eq!(body["completionOptions"]["stream"], false);
        assert_eq!(body["completionOptions"]["temperature"], 0.6);
        assert_eq!(body["completionOptions"]["maxTokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["text"], SYSTEM_PREAMBLE);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["text"], "Tell me about courage");
    }

    #[test]
    fn test_first_alternative_wins() {
        let body = json!({
            "result": {
                "alternatives": [
                    {"message": {"role": "assistant", "text": "«First» - A"}},
                    {"message": {"role": "assistant", "text": "«Second» - B"}}
                ]
            }
        });

        let result = parse_completion_body(&body);
        assert!(result.is_success());
        assert_eq!(result.response, "«First» - A");
    }

    #[test]
    fn test_empty_alternatives_tagged_error() {
        let body = json!({"result": {"alternatives": []}});
        let result = parse_completion_body(&body);
        assert_eq!(result.status, CompletionStatus::Error);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let result = CompletionResult {
            response: "x".to_string(),
            status: CompletionStatus::Success,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "success");
    }
}
