//! Chat-completion client for DeepSeek and other OpenAI-compatible endpoints.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling settings for answer generation.
pub const ANSWER_TEMPERATURE: f32 = 0.3;
pub const ANSWER_MAX_TOKENS: u32 = 300;

/// Token budget for the longer learning-plan and email drafts.
pub const DRAFT_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM API key is not configured")]
    NotConfigured,

    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode LLM response: {0}")]
    Decode(String),

    #[error("LLM returned an empty completion")]
    EmptyCompletion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Per-call sampling options. `None` leaves the provider default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: u32,
}

impl ChatOptions {
    pub fn answer() -> Self {
        Self {
            temperature: Some(ANSWER_TEMPERATURE),
            max_tokens: ANSWER_MAX_TOKENS,
        }
    }

    pub fn draft() -> Self {
        Self {
            temperature: None,
            max_tokens: DRAFT_MAX_TOKENS,
        }
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Return the assistant message for `messages`.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<String, GenerationError>;
}

/// Settings for [`DeepSeekClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

pub struct DeepSeekClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl DeepSeekClient {
    pub fn new(config: LlmConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatClient for DeepSeekClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<String, GenerationError> {
        let api_key = self.api_key().ok_or(GenerationError::NotConfigured)?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| GenerationError::NotConfigured)?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };
        debug!(
            model = %self.config.model,
            messages = messages.len(),
            max_tokens = options.max_tokens,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .headers(headers)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            warn!("Chat completion returned {}", status);
            return Err(GenerationError::Api { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        first_choice(parsed)
    }
}

fn first_choice(response: ChatResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(GenerationError::EmptyCompletion)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Turns an assembled prompt into an answer with one user message.
#[derive(Clone)]
pub struct AnswerGenerator {
    client: Arc<dyn ChatClient>,
    options: ChatOptions,
}

impl AnswerGenerator {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client,
            options: ChatOptions::answer(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!("Generating answer for prompt of {} chars", prompt.chars().count());
        self.client
            .complete(&[ChatMessage::user(prompt)], self.options)
            .await
    }
}
