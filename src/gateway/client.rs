//! # Model Client
//!
//! The [`ModelGateway`] trait is the single seam to the vision-language
//! model: one image, one instruction, free-form text back. Both the
//! perception and the decision passes go through it, and tests substitute
//! scripted implementations.
//!
//! [`QwenGateway`] speaks the OpenAI-compatible chat completions protocol
//! (DashScope compatible mode by default) over a blocking `reqwest` client.
//! Calls run on the analysis worker, never on the render loop.
//!
//! ## Error Mapping
//!
//! | Outcome | Error |
//! |---------|-------|
//! | connect failure, reset, timeout | `Transport` |
//! | HTTP 401 / 403 | `Auth` |
//! | other non-success status | `Transport` |
//! | reply without message content | `MalformedModelOutput` |

use std::time::Duration;

use reqwest::{StatusCode, blocking::Client};
use serde::Deserialize;
use serde_json::{Value, json};

use super::encode::EncodedImage;
use crate::error::{TutorError, TutorResult};

/// Opaque vision-language model call.
pub trait ModelGateway: Send + Sync {
    /// Send one image and instruction, returning the model's raw reply text.
    fn call(
        &self,
        image: Option<&EncodedImage>,
        instruction: &str,
        max_output_tokens: u32,
    ) -> TutorResult<String>;
}

/// Connection settings for [`QwenGateway`].
#[derive(Clone, PartialEq)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &crate::config::mask_credential(&self.api_key))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<Value>,
}

/// OpenAI-compatible chat completions client.
pub struct QwenGateway {
    client: Client,
    config: GatewayConfig,
}

impl QwenGateway {
    /// Build the HTTP client. Must not be called from inside an async context.
    pub fn new(config: GatewayConfig) -> TutorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                TutorError::transport("build_client", e.to_string())
                    .with_severity(crate::error::ErrorSeverity::Fatal)
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// Check the credential against the endpoint before the loop starts.
    ///
    /// A rejected credential is an `Auth` error. Other failures are returned
    /// as `Transport` so the caller may decide to continue.
    pub fn probe(&self) -> TutorResult<()> {
        let response = self
            .client
            .get(self.url("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .map_err(|e| map_request_error("probe", e))?;

        let status = response.status();
        if status.is_success() {
            log::info!("model endpoint reachable at {}", self.config.endpoint);
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        Err(map_status("probe", status, &body))
    }

    fn request_body(
        &self,
        image: Option<&EncodedImage>,
        instruction: &str,
        max_output_tokens: u32,
    ) -> Value {
        let mut content = Vec::with_capacity(2);
        if let Some(image) = image {
            content.push(json!({
                "type": "image_url",
                "image_url": { "url": image.data_uri },
            }));
        }
        content.push(json!({ "type": "text", "text": instruction }));

        json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": max_output_tokens,
        })
    }
}

impl ModelGateway for QwenGateway {
    fn call(
        &self,
        image: Option<&EncodedImage>,
        instruction: &str,
        max_output_tokens: u32,
    ) -> TutorResult<String> {
        let body = self.request_body(image, instruction, max_output_tokens);
        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .map_err(|e| map_request_error("chat_completions", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(map_status("chat_completions", status, &text));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| TutorError::malformed("chat_completions", e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .and_then(content_text)
            .ok_or_else(|| TutorError::malformed("chat_completions", "reply has no message content"))?;

        log::debug!("model reply ({} chars): {}", content.len(), content);
        Ok(content.trim().to_string())
    }
}

/// Message content is either a string or a list of typed parts.
fn content_text(content: Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text),
        Value::Array(parts) => {
            let text: String = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

fn map_request_error(operation: &str, error: reqwest::Error) -> TutorError {
    if error.is_timeout() {
        TutorError::timeout(operation, error.to_string()).with_source(error)
    } else {
        TutorError::transport(operation, error.to_string()).with_source(error)
    }
}

fn map_status(operation: &str, status: StatusCode, body: &str) -> TutorError {
    let snippet: String = body.chars().take(200).collect();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TutorError::auth(operation, format!("{}: {}", status, snippet))
                .with_recovery_suggestion("Check DASHSCOPE_API_KEY; run `desk-tutor check-env`")
        }
        _ => TutorError::transport(operation, format!("{}: {}", status, snippet)),
    }
}
