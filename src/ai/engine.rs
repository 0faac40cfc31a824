//! Explanation Service - one question in, one parsed explanation out
//!
//! Composes [`PromptBuilder`], a single model call and [`ResponseParser`].
//! This is one of the two fault boundaries of the crate: every provider
//! failure, timeout or empty answer comes back as a [`GenerationError`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::RwLock;

use crate::errors::GenerationError;

use super::audience::AudienceProfile;
use super::config::AiConfig;
use super::prompt::PromptBuilder;
use super::provider::{create_provider, AiProvider, CompletionRequest};
use super::response::{ExplanationMetadata, ExplanationResult, ResponseParser};

/// Service that turns questions into audience-tailored explanations
pub struct ExplanationService {
    /// AI provider instance
    provider: Arc<dyn AiProvider>,
    /// Prompt construction
    prompts: PromptBuilder,
    /// Upper bound for one model call
    timeout: Duration,
    /// Sampling temperature
    temperature: f32,
    /// Token cap forwarded to the provider
    max_tokens: u32,
    /// Statistics tracking
    stats: Arc<RwLock<EngineStats>>,
}

/// Statistics for the explanation service
#[derive(Debug, Default, Clone)]
pub struct EngineStats {
    /// Successful explanations
    pub total_explanations: u64,
    /// Failed requests, timeouts included
    pub failures: u64,
    /// Requests that hit the timeout
    pub timeouts: u64,
    /// API calls made
    pub api_calls: u64,
    /// Total tokens used
    pub tokens_used: u64,
    /// Total response time in milliseconds
    pub total_response_time_ms: u64,
}

impl EngineStats {
    /// Share of API calls that failed, as a percentage
    pub fn failure_rate(&self) -> f64 {
        if self.api_calls == 0 {
            0.0
        } else {
            (self.failures as f64 / self.api_calls as f64) * 100.0
        }
    }

    /// Calculate average response time
    pub fn avg_response_time_ms(&self) -> u64 {
        if self.total_explanations == 0 {
            0
        } else {
            self.total_response_time_ms / self.total_explanations
        }
    }
}

impl ExplanationService {
    /// Create a service with the provider described by `config`
    pub fn new(config: &AiConfig) -> Result<Self> {
        let provider = create_provider(config)?;
        Ok(Self::with_provider(Arc::from(provider), config))
    }

    /// Create a service around an existing provider
    pub fn with_provider(provider: Arc<dyn AiProvider>, config: &AiConfig) -> Self {
        Self {
            provider,
            prompts: PromptBuilder::new(),
            timeout: config.timeout(),
            temperature: config.explanation_temperature,
            max_tokens: config.max_tokens,
            stats: Arc::new(RwLock::new(EngineStats::default())),
        }
    }

    /// Replace the prompt builder
    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the provider name
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        self.provider.model()
    }

    /// Temperature used for explanation calls
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Explain `question` for the given audience
    pub async fn explain(
        &self,
        question: &str,
        audience: &AudienceProfile,
    ) -> Result<ExplanationResult, GenerationError> {
        let prompt = self.prompts.build(question, audience);
        let request = CompletionRequest::new(prompt.messages(), self.temperature)
            .with_max_tokens(self.max_tokens);

        tracing::debug!(
            "Requesting explanation from {} ({}), note={:?}, tone={}",
            self.provider.name(),
            self.provider.model(),
            audience.note(),
            audience.tone
        );

        let start = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.provider.complete(&request)).await;

        let mut stats = self.stats.write().await;
        stats.api_calls += 1;

        let completion = match outcome {
            Ok(Ok(completion)) => completion,
            Ok(Err(e)) => {
                stats.failures += 1;
                let err = GenerationError::provider(&e);
                tracing::warn!("Explanation failed: {}", err);
                return Err(err);
            }
            Err(_) => {
                stats.failures += 1;
                stats.timeouts += 1;
                let err = GenerationError::Timeout {
                    millis: self.timeout.as_millis() as u64,
                };
                tracing::warn!("Explanation failed: {}", err);
                return Err(err);
            }
        };

        let parsed = ResponseParser::parse(&completion.text);
        if parsed.is_empty() {
            stats.failures += 1;
            tracing::warn!("Explanation failed: {}", GenerationError::EmptyResponse);
            return Err(GenerationError::EmptyResponse);
        }

        let elapsed_ms = match completion.response_time_ms {
            0 => start.elapsed().as_millis() as u64,
            ms => ms,
        };

        stats.total_explanations += 1;
        stats.tokens_used += completion.tokens_used as u64;
        stats.total_response_time_ms += elapsed_ms;

        let metadata = ExplanationMetadata::new(self.provider.name(), self.provider.model())
            .with_tokens(completion.tokens_used)
            .with_response_time(elapsed_ms);

        Ok(parsed.with_metadata(metadata))
    }

    /// Check if the AI provider is available
    pub async fn health_check(&self) -> Result<bool> {
        self.provider.health_check().await
    }

    /// Get current service statistics
    pub async fn stats(&self) -> EngineStats {
        self.stats.read().await.clone()
    }
}
