//! AI Provider - language-model collaborator
//!
//! Defines the request/response shape every model backend implements
//! and provides adapters for OpenAI, Anthropic, Ollama, plus a scripted
//! mock for tests. Any provider implementing [`AiProvider`] is
//! interchangeable.

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// Re-exports
pub use anthropic::AnthropicProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message of a chat request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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

/// A single model call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Ordered messages, system prompt first
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on generated tokens, provider default when unset
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, temperature: f32) -> Self {
        Self {
            messages,
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Content of the leading system message, if any
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Messages other than the system prompt
    pub fn conversation(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }
}

/// Generated text plus usage details
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tokens_used: u32,
    pub response_time_ms: u64,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Trait for language-model backends
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &'static str;

    /// Model being used
    fn model(&self) -> &str;

    /// Issue one chat completion
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;

    /// Check if provider is available and configured correctly
    async fn health_check(&self) -> Result<bool>;
}

/// Error types for AI providers
#[derive(Debug, thiserror::Error)]
pub enum AiProviderError {
    #[error("API key not configured for {provider}")]
    MissingApiKey { provider: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded { message: String },

    #[error("API error from {provider}: {message}")]
    ApiError { provider: String, message: String },

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("Request timeout after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Provider {provider} is not available: {reason}")]
    Unavailable { provider: String, reason: String },
}

/// Build the shared HTTP client for an adapter
pub(crate) fn http_client(provider: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            AiProviderError::Unavailable {
                provider: provider.to_string(),
                reason: format!("failed to create HTTP client: {}", e),
            }
            .into()
        })
}

/// Map a reqwest send error, keeping timeouts distinguishable
pub(crate) fn send_error(provider: &str, timeout: Duration, err: reqwest::Error) -> anyhow::Error {
    if err.is_timeout() {
        AiProviderError::Timeout {
            seconds: timeout.as_secs(),
        }
        .into()
    } else {
        anyhow::Error::new(err).context(format!("Failed to send request to {} API", provider))
    }
}

/// Create a provider based on configuration
pub fn create_provider(config: &super::config::AiConfig) -> Result<Box<dyn AiProvider>> {
    use super::config::AiProvider as Kind;

    match config.provider {
        Kind::OpenAI => {
            let api_key = config
                .api_key
                .clone()
                .or_else(|| std::env::var(Kind::OpenAI.env_key_name()).ok())
                .ok_or_else(|| AiProviderError::MissingApiKey {
                    provider: "OpenAI".to_string(),
                })?;

            Ok(Box::new(OpenAiProvider::new(
                api_key,
                config.model.clone(),
                config.max_tokens,
                config.timeout(),
            )?))
        }
        Kind::Anthropic => {
            let api_key = config
                .api_key
                .clone()
                .or_else(|| std::env::var(Kind::Anthropic.env_key_name()).ok())
                .ok_or_else(|| AiProviderError::MissingApiKey {
                    provider: "Anthropic".to_string(),
                })?;

            Ok(Box::new(AnthropicProvider::new(
                api_key,
                config.model.clone(),
                config.max_tokens,
                config.timeout(),
            )?))
        }
        Kind::Ollama => Ok(Box::new(OllamaProvider::new(
            config.ollama_url.clone(),
            config.model.clone(),
            config.timeout(),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::config::{AiConfig, AiProvider as Kind};

    #[test]
    fn error_display() {
        let err = AiProviderError::MissingApiKey {
            provider: "OpenAI".to_string(),
        };
        assert!(err.to_string().contains("OpenAI"));

        let err = AiProviderError::Timeout { seconds: 30 };
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn request_splits_system_prompt() {
        let request = CompletionRequest::new(
            vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
            0.7,
        );
        assert_eq!(request.system_prompt(), Some("be brief"));
        let rest: Vec<_> = request.conversation().collect();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].role, Role::User);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::system("x")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"x"}"#);
    }

    #[test]
    fn create_provider_ollama_success() {
        let config = AiConfig::builder()
            .provider(Kind::Ollama)
            .model("llama3.2")
            .build();

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "Ollama");
        assert_eq!(provider.model(), "llama3.2");
    }

    #[test]
    fn create_provider_openai_with_config_key() {
        let config = AiConfig::builder()
            .provider(Kind::OpenAI)
            .model("gpt-4o")
            .api_key("test-key")
            .build();

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "OpenAI");
        assert_eq!(provider.model(), "gpt-4o");
    }

    #[test]
    fn create_provider_anthropic_with_config_key() {
        let config = AiConfig::builder()
            .provider(Kind::Anthropic)
            .api_key("test-key")
            .build();

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "Anthropic");
        assert_eq!(provider.model(), Kind::Anthropic.default_model());
    }
}
