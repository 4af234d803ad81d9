use crate::clean::strip_thinking;
use crate::error::{AssistError, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use sprint_core::config::GenerationConfig;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// GenerationClient
// ---------------------------------------------------------------------------

/// Blocking client for `POST {base}/v1/chat/completions`.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl GenerationClient {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `true` iff `GET /v1/models` answers 200 within the health timeout.
    pub fn check_connection(&self) -> bool {
        let url = format!("{}/v1/models", self.base_url);
        match self.http.get(&url).timeout(self.health_timeout).send() {
            Ok(resp) => resp.status().as_u16() == 200,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "generation endpoint not reachable");
                false
            }
        }
    }

    /// Send `messages` and return the cleaned reply text. `temperature`
    /// falls back to the configured default.
    pub fn complete(&self, messages: &[ChatMessage], temperature: Option<f32>) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: temperature.unwrap_or(self.temperature),
            stream: false,
        };

        tracing::info!(model = %self.model, messages = messages.len(), "requesting completion");
        let resp = self
            .http
            .post(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssistError::Status(status.as_u16()));
        }

        let text = resp.text()?;
        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| AssistError::MalformedResponse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                AssistError::MalformedResponse("response has no choices[0].message.content".into())
            })?;

        Ok(strip_thinking(&content))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
