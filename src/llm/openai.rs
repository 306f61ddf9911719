//! OpenAI-compatible chat-completions client.
//!
//! Works against any endpoint that speaks `POST {api_base}/chat/completions`
//! (OpenAI, Azure deployments, local vLLM / llama.cpp servers).

use super::{ChatMessage, CompletionOptions, NarrativeClient};
use crate::config::LlmConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn request<'a>(&'a self, messages: &'a [ChatMessage], options: &CompletionOptions) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages,
            temperature: options.temperature.or(self.config.temperature),
            stop: options.stop.clone(),
        }
    }
}

#[async_trait]
impl NarrativeClient for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        debug!("POST {} ({} messages)", url, messages.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.request(messages, options))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(match status.as_u16() {
                401 | 403 => LlmError::Unauthorized(self.config.api_base.clone()),
                429 => LlmError::RateLimited(body),
                code => LlmError::Status { status: code, body },
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::UnexpectedResponse(format!("failed to parse response: {e}")))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "tokens: {} prompt / {} completion",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        extract_content(parsed)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn extract_content(response: ChatResponse) -> Result<String, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::UnexpectedResponse("no choices in response".to_string()))?;

    choice
        .message
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| LlmError::UnexpectedResponse("empty message content".to_string()))
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
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

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
