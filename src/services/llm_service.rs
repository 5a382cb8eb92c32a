//! Chat-completion capability.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint and asks for a
//! strict JSON object back. Callers get the raw message content and are
//! responsible for schema validation.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    NotConfigured,

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM returned malformed output: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    /// Ask the model to answer with a single JSON document.
    pub json_response: bool,
}

impl CompletionRequest {
    pub fn json(system: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature,
            json_response: true,
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the message content of the first choice.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        if config.openai_api_key.is_none() {
            log::warn!("OPENAI_API_KEY not set, itinerary generation will use demo data");
        }
        Self::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "temperature": request.temperature,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt }
            ]
        });
        if request.json_response {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

/// Strict parse of model output into `T`, reporting where the shape diverged.
pub fn parse_structured<T: DeserializeOwned>(raw: &str, schema_name: &str) -> Result<T, LlmError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw.trim());
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        LlmError::Malformed(format!(
            "failed to deserialize `{}` at {}: {}",
            schema_name,
            location,
            err.inner()
        ))
    })
}

fn build_chat_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::NotConfigured)?;

        let response = self
            .http_client
            .post(build_chat_url(&self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_body(&request))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Request(err.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(LlmError::NotConfigured);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| LlmError::Malformed(err.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::Malformed("response contained no message content".to_string()))
    }
}
