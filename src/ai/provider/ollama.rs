//! Ollama Provider - Local model integration
//!
//! Implements the AiProvider trait for locally-running Ollama models via
//! the `/api/chat` endpoint. Needs no credential, which makes it the
//! offline option.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    http_client, send_error, AiProvider, AiProviderError, ChatMessage, Completion,
    CompletionRequest,
};

/// Ollama local model provider
pub struct OllamaProvider {
    base_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url,
            model,
            timeout,
            client: http_client("Ollama", timeout)?,
        })
    }

    /// Get the chat API endpoint URL
    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    /// Make a request to the Ollama API
    async fn make_request(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(self.chat_url())
            .json(request)
            .send()
            .await
            .map_err(|e| send_error("Ollama", self.timeout, e))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AiProviderError::ApiError {
                provider: "Ollama".to_string(),
                message: format!("HTTP {}: {}", status, error_text),
            }
            .into());
        }

        response
            .json()
            .await
            .context("Failed to parse Ollama API response")
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let start = Instant::now();

        let body = ChatRequest {
            model: self.model.clone(),
            messages: request.messages.clone(),
            stream: false,
            options: ChatOptions {
                temperature: Some(request.temperature),
                num_predict: request.max_tokens,
            },
        };

        let response = self.make_request(&body).await?;
        let message = response.message.ok_or_else(|| AiProviderError::InvalidResponse {
            provider: "Ollama".to_string(),
            message: "response contained no message".to_string(),
        })?;

        Ok(Completion {
            text: message.content.trim().to_string(),
            tokens_used: response.prompt_eval_count + response.eval_count,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        // Check if Ollama is running by hitting the version endpoint
        let url = format!("{}/api/version", self.base_url.trim_end_matches('/'));

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

// API Request/Response types

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}
