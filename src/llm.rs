//! LLM client abstraction and the Gemini implementation.
//!
//! [`TextGenerator`] is the seam between request handlers and the remote
//! model: handlers hold a trait object, production wires in
//! [`GeminiClient`], and tests inject a scripted stub.
//!
//! No retries are performed at any layer — a failed call surfaces as a
//! request failure — and no timeout is imposed beyond what the transport
//! provides; a call blocks its own request until the remote settles.

use async_trait::async_trait;
use std::time::Instant;

use crate::config::Config;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug)]
pub enum LlmError {
    /// Network-level failure (DNS, connect, broken stream).
    Transport(String),
    /// The API answered with a non-success status.
    Api { status: u16, detail: String },
    /// The call succeeded but the response carried no candidate text.
    NoCandidate,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::Transport(e) => write!(f, "LLM transport error: {}", e),
            LlmError::Api { status, detail } => {
                write!(f, "LLM API error {}: {}", status, detail)
            }
            LlmError::NoCandidate => write!(f, "LLM response contained no candidate text"),
        }
    }
}

impl std::error::Error for LlmError {}

/// Sends a prompt to a text-generation backend and returns the raw reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let started = Instant::now();
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(
                model = %self.model,
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "generateContent call failed"
            );
            return Err(LlmError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let text = candidate_text(&json).ok_or(LlmError::NoCandidate)?;

        tracing::info!(
            model = %self.model,
            prompt_length = prompt.len(),
            reply_length = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generateContent call completed"
        );

        Ok(text)
    }
}

/// Extracts `candidates[0].content.parts[0].text` from a
/// `generateContent` response body.
fn candidate_text(json: &serde_json::Value) -> Option<String> {
    json.get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()
        .map(|s| s.to_string())
}
