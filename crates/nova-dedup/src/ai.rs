use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::AiNamingConfig;

#[derive(Clone, Debug, Error)]
pub enum AiError {
    #[error("http error: {0}")]
    Http(Arc<reqwest::Error>),
    #[error("json error: {0}")]
    Json(Arc<serde_json::Error>),
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(Arc::new(err))
        }
    }
}

impl From<serde_json::Error> for AiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}

/// Stateless prompt-in, text-out service.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

/// Blocking client for `POST {base}/v1/chat/completions`.
#[derive(Clone)]
pub struct OpenAiCompatibleGenerator {
    base_url: Url,
    model: String,
    timeout: Duration,
    max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl OpenAiCompatibleGenerator {
    pub fn new(
        base_url: Url,
        model: impl Into<String>,
        timeout: Duration,
        api_key: Option<String>,
        max_tokens: u32,
    ) -> Result<Self, AiError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.as_deref() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|e| AiError::InvalidConfig(e.to_string()))?,
            );
        }

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url,
            model: model.into(),
            timeout,
            max_tokens,
            client,
        })
    }

    pub fn from_config(config: &AiNamingConfig) -> Result<Self, AiError> {
        if config.model.trim().is_empty() {
            return Err(AiError::InvalidConfig("model must not be empty".into()));
        }
        let base_url = Url::parse(&config.base_url)?;
        Self::new(
            base_url,
            config.model.clone(),
            Duration::from_millis(config.timeout_ms),
            config.api_key.clone(),
            config.max_tokens,
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, AiError> {
        // Accept both `http://host:port` and `http://host:port/v1`.
        let base_str = self.base_url.as_str().trim_end_matches('/').to_string();
        let base = Url::parse(&format!("{base_str}/"))?;

        let base_path = base.path().trim_end_matches('/');
        if base_path.ends_with("/v1") {
            Ok(base.join(path.trim_start_matches('/'))?)
        } else {
            Ok(base.join(&format!("v1/{}", path.trim_start_matches('/')))?)
        }
    }
}

impl TextGenerator for OpenAiCompatibleGenerator {
    fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let url = self.endpoint("/chat/completions")?;
        let messages = [ChatMessage {
            role: "user",
            content: prompt,
        }];
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &messages,
            max_tokens: Some(self.max_tokens),
            temperature: Some(0.0),
            stream: false,
        };

        tracing::debug!(
            target = "nova.dedup.ai",
            model = %self.model,
            timeout_ms = self.timeout.as_millis() as u64,
            "requesting name suggestion"
        );
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()?
            .error_for_status()?;
        let text = response.text()?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AiError::UnexpectedResponse("missing choices[0].message.content".into()))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage<'a>],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}
