//! Anthropic Provider - Claude messages API
//!
//! Implements the AiProvider trait for Anthropic's Claude models. The
//! messages API takes the system prompt as a separate field.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    http_client, send_error, AiProvider, AiProviderError, ChatMessage, Completion,
    CompletionRequest,
};

/// Anthropic Claude API provider
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicProvider {
    const API_URL: &'static str = "https://api.anthropic.com/v1/messages";
    const API_VERSION: &'static str = "2023-06-01";

    /// Create a new Anthropic provider
    pub fn new(api_key: String, model: String, max_tokens: u32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            model,
            max_tokens,
            timeout,
            client: http_client("Anthropic", timeout)?,
        })
    }

    /// Make a request to the Anthropic API
    async fn make_request(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let response = self
            .client
            .post(Self::API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| send_error("Anthropic", self.timeout, e))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiProviderError::RateLimitExceeded {
                message: "Anthropic API rate limit exceeded".to_string(),
            }
            .into());
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AiProviderError::ApiError {
                provider: "Anthropic".to_string(),
                message: format!("HTTP {}: {}", status, error_text),
            }
            .into());
        }

        response
            .json()
            .await
            .context("Failed to parse Anthropic API response")
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "Anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let start = Instant::now();

        let body = ApiRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            temperature: Some(request.temperature),
            system: request.system_prompt().map(str::to_string),
            messages: request.conversation().cloned().collect(),
        };

        let response = self.make_request(&body).await?;
        let text = extract_text(&response)?;

        Ok(Completion {
            text,
            tokens_used: response
                .usage
                .map(|u| u.input_tokens + u.output_tokens)
                .unwrap_or(0),
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let request = ApiRequest {
            model: self.model.clone(),
            max_tokens: 10,
            temperature: Some(0.0),
            system: None,
            messages: vec![ChatMessage::user("Respond with just the word 'ok'")],
        };

        let response = self
            .client
            .post(Self::API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

/// Concatenate the text blocks of the response envelope
fn extract_text(response: &ApiResponse) -> Result<String> {
    if response.content.is_empty() {
        return Err(AiProviderError::InvalidResponse {
            provider: "Anthropic".to_string(),
            message: "response contained no content blocks".to_string(),
        }
        .into());
    }

    Ok(response
        .content
        .iter()
        .filter_map(|block| block.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string())
}

// API Request/Response types

#[derive(Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}
