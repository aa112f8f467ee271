//! Model backend abstraction and the Ollama chat client.
//!
//! A backend takes a system instruction plus a context payload and returns
//! free-form text. Nothing it returns is trusted: callers pass the text
//! through [`crate::extract::extract_document`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use boardsmith_shared::{BoardsmithError, ModelConfig, Result};

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("Boardsmith/", env!("CARGO_PKG_VERSION"));

/// Any model that answers a system instruction plus context with text.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// One blocking round-trip. Transport or backend failures are model call errors.
    async fn complete(&self, system: &str, context: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for Ollama's `/api/chat` endpoint.
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
    json_format_hint: bool,
}

impl OllamaClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BoardsmithError::ModelCall(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            json_format_hint: config.json_format_hint,
        })
    }
}

#[async_trait]
impl ModelBackend for OllamaClient {
    #[instrument(skip_all, fields(model = %self.model, context_len = context.len()))]
    async fn complete(&self, system: &str, context: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: context,
                },
            ],
            format: self.json_format_hint.then_some("json"),
            stream: false,
        };

        let started = std::time::Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| BoardsmithError::ModelCall(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let prefix: String = body.chars().take(200).collect();
            return Err(BoardsmithError::ModelCall(format!(
                "{}: HTTP {status}: {prefix}",
                self.endpoint
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            BoardsmithError::ModelCall(format!("{}: invalid response body: {e}", self.endpoint))
        })?;

        let content = body
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| BoardsmithError::ModelCall("response has no message content".into()))?;

        debug!(
            latency_ms = started.elapsed().as_millis() as u64,
            reply_len = content.len(),
            "model reply received"
        );

        Ok(content)
    }
}
