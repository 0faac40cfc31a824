//! OpenAI Provider - GPT chat completions
//!
//! Implements the AiProvider trait for OpenAI's chat completions API.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    http_client, send_error, AiProvider, AiProviderError, ChatMessage, Completion,
    CompletionRequest,
};

/// OpenAI GPT API provider
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiProvider {
    const API_URL: &'static str = "https://api.openai.com/v1/chat/completions";

    /// Create a new OpenAI provider
    pub fn new(api_key: String, model: String, max_tokens: u32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            model,
            max_tokens,
            timeout,
            client: http_client("OpenAI", timeout)?,
        })
    }

    /// Make a request to the OpenAI API
    async fn make_request(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(Self::API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| send_error("OpenAI", self.timeout, e))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiProviderError::RateLimitExceeded {
                message: "OpenAI API rate limit exceeded".to_string(),
            }
            .into());
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AiProviderError::ApiError {
                provider: "OpenAI".to_string(),
                message: format!("HTTP {}: {}", status, error_text),
            }
            .into());
        }

        response
            .json()
            .await
            .context("Failed to parse OpenAI API response")
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let start = Instant::now();

        let body = ChatRequest {
            model: self.model.clone(),
            messages: request.messages.clone(),
            max_tokens: Some(request.max_tokens.unwrap_or(self.max_tokens)),
            temperature: Some(request.temperature),
        };

        let response = self.make_request(&body).await?;
        let text = extract_text(&response)?;

        Ok(Completion {
            text,
            tokens_used: response.usage.map(|u| u.total_tokens).unwrap_or(0),
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system("You are a helpful assistant."),
                ChatMessage::user("Respond with just the word 'ok'"),
            ],
            max_tokens: Some(10),
            temperature: Some(0.0),
        };

        let response = self
            .client
            .post(Self::API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

/// Pull the first choice out of the response envelope
fn extract_text(response: &ChatResponse) -> Result<String> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| AiProviderError::InvalidResponse {
            provider: "OpenAI".to_string(),
            message: "response contained no choices".to_string(),
        })?;

    choice
        .message
        .content
        .as_deref()
        .map(|text| text.trim().to_string())
        .ok_or_else(|| {
            AiProviderError::InvalidResponse {
                provider: "OpenAI".to_string(),
                message: "first choice has no message content".to_string(),
            }
            .into()
        })
}

// API Request/Response types

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct TokenUsage {
    total_tokens: u32,
}
