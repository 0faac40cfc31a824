//! AI Configuration - Provider and model settings
//!
//! Defines configuration for model providers: credential, model
//! selection, temperatures for the two model calls, timeouts and
//! the resource limits applied to generated chart code.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chart::runner::RunnerLimits;
use crate::errors::ConfigError;

/// Temperature for explanation requests
pub const EXPLANATION_TEMPERATURE: f32 = 0.7;

/// Temperature for chart-code requests
pub const CHART_TEMPERATURE: f32 = 0.6;

/// AI provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// OpenAI GPT models
    #[default]
    OpenAI,
    /// Anthropic Claude models
    Anthropic,
    /// Local Ollama models
    Ollama,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAI => "openai",
            AiProvider::Anthropic => "anthropic",
            AiProvider::Ollama => "ollama",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::OpenAI => "gpt-4o",
            AiProvider::Anthropic => "claude-sonnet-4-20250514",
            AiProvider::Ollama => "llama3.2",
        }
    }

    pub fn env_key_name(&self) -> &'static str {
        match self {
            AiProvider::OpenAI => "OPENAI_API_KEY",
            AiProvider::Anthropic => "ANTHROPIC_API_KEY",
            AiProvider::Ollama => "OLLAMA_BASE_URL",
        }
    }

    /// Whether a credential is needed to talk to this provider
    pub fn requires_credential(&self) -> bool {
        !matches!(self, AiProvider::Ollama)
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AiProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "gpt" => Ok(AiProvider::OpenAI),
            "anthropic" | "claude" => Ok(AiProvider::Anthropic),
            "ollama" | "local" => Ok(AiProvider::Ollama),
            _ => Err(()),
        }
    }
}

/// AI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Active provider
    pub provider: AiProvider,
    /// Model identifier
    pub model: String,
    /// API key (loaded from environment)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Ollama base URL
    pub ollama_url: String,
    /// Maximum tokens for a response
    pub max_tokens: u32,
    /// Temperature for explanation requests
    pub explanation_temperature: f32,
    /// Temperature for chart-code requests
    pub chart_temperature: f32,
    /// Upper bound for a single model call, in seconds
    pub timeout_secs: u64,
    /// Limits for generated chart code
    pub script_limits: RunnerLimits,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            model: AiProvider::default().default_model().to_string(),
            api_key: None,
            ollama_url: "http://localhost:11434".to_string(),
            max_tokens: 1024,
            explanation_temperature: EXPLANATION_TEMPERATURE,
            chart_temperature: CHART_TEMPERATURE,
            timeout_secs: 60,
            script_limits: RunnerLimits::default(),
        }
    }
}

impl AiConfig {
    /// Create config for OpenAI GPT
    pub fn openai() -> Self {
        Self::default().with_provider(AiProvider::OpenAI)
    }

    /// Create config for Anthropic Claude
    pub fn anthropic() -> Self {
        Self::default().with_provider(AiProvider::Anthropic)
    }

    /// Create config for local Ollama
    pub fn ollama() -> Self {
        Self::default().with_provider(AiProvider::Ollama)
    }

    /// Set the provider
    pub fn with_provider(mut self, provider: AiProvider) -> Self {
        self.provider = provider;
        self.model = provider.default_model().to_string();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the per-call timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load API key from environment
    pub fn load_api_key_from_env(&mut self) {
        if self.api_key.is_none() && self.provider.requires_credential() {
            self.api_key = std::env::var(self.provider.env_key_name())
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
    }

    /// Check if API key is available
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || !self.provider.requires_credential()
    }

    /// Validate configuration. Call once at startup, before any request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.has_api_key() {
            return Err(ConfigError::missing_credential(self.provider.env_key_name()));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("model", "must not be empty"));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::invalid("max_tokens", "must be greater than 0"));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("timeout_secs", "must be greater than 0"));
        }

        for (field, temp) in [
            ("explanation_temperature", self.explanation_temperature),
            ("chart_temperature", self.chart_temperature),
        ] {
            if !(0.0..=2.0).contains(&temp) {
                return Err(ConfigError::invalid(field, "must be between 0.0 and 2.0"));
            }
        }

        self.script_limits.validate()
    }
}

/// Builder for AiConfig
#[derive(Debug, Clone, Default)]
pub struct AiConfigBuilder {
    provider: Option<AiProvider>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<u64>,
    max_tokens: Option<u32>,
}

impl AiConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: AiProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn build(self) -> AiConfig {
        let mut config = AiConfig::default().with_provider(self.provider.unwrap_or_default());

        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(key) = self.api_key {
            config.api_key = Some(key);
        }
        if let Some(url) = self.base_url {
            config.ollama_url = url;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(tokens) = self.max_tokens {
            config.max_tokens = tokens;
        }

        config
    }
}

impl AiConfig {
    /// Create a builder for configuration
    pub fn builder() -> AiConfigBuilder {
        AiConfigBuilder::new()
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

impl AiConfig {
    /// Candidate config file locations, most specific first
    ///
    /// 1. Specified path (if provided)
    /// 2. healthlens.toml / .healthlens.toml in current directory
    /// 3. <config_dir>/healthlens/config.toml
    pub fn config_paths(path: Option<&Path>) -> Vec<PathBuf> {
        if let Some(p) = path {
            return vec![p.to_path_buf()];
        }

        let mut paths = vec![
            PathBuf::from("healthlens.toml"),
            PathBuf::from(".healthlens.toml"),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("healthlens").join("config.toml"));
        }
        paths
    }

    /// Load configuration from the first existing config file, or defaults.
    ///
    /// An explicitly given path that does not exist is an error. The API key
    /// is always taken from the environment, never from the file.
    pub fn load(path: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        if let Some(p) = path {
            if !p.exists() {
                return Err(ConfigError::FileRead {
                    path: p.display().to_string(),
                    message: "file does not exist".to_string(),
                });
            }
        }

        for candidate in Self::config_paths(path) {
            if candidate.exists() {
                let content =
                    std::fs::read_to_string(&candidate).map_err(|e| ConfigError::FileRead {
                        path: candidate.display().to_string(),
                        message: e.to_string(),
                    })?;
                let mut config = Self::parse_toml(&content).map_err(|message| {
                    ConfigError::FileParse {
                        path: candidate.display().to_string(),
                        message,
                    }
                })?;
                config.load_api_key_from_env();
                tracing::debug!("Loaded config from {}", candidate.display());
                return Ok((config, ConfigSource::File(candidate)));
            }
        }

        tracing::debug!("No config file found, using defaults");
        let mut config = Self::default();
        config.load_api_key_from_env();
        Ok((config, ConfigSource::Defaults))
    }

    /// Parse `[ai]` and optional `[chart]` tables
    fn parse_toml(content: &str) -> Result<Self, String> {
        let table: toml::Table = content
            .parse()
            .map_err(|e: toml::de::Error| e.to_string())?;

        let ai_section = table
            .get("ai")
            .and_then(|v| v.as_table())
            .ok_or_else(|| "missing required section [ai]".to_string())?;

        let mut config = AiConfig::default();

        if let Some(provider_str) = ai_section.get("provider").and_then(|v| v.as_str()) {
            let provider = provider_str
                .parse::<AiProvider>()
                .map_err(|_| format!("unknown provider '{}'", provider_str))?;
            config = config.with_provider(provider);
        }

        if let Some(model) = ai_section.get("model").and_then(|v| v.as_str()) {
            config.model = model.to_string();
        }

        if let Some(url) = ai_section.get("ollama_url").and_then(|v| v.as_str()) {
            config.ollama_url = url.to_string();
        }

        if let Some(tokens) = ai_section.get("max_tokens").and_then(|v| v.as_integer()) {
            config.max_tokens = tokens.max(0) as u32;
        }

        if let Some(timeout) = ai_section.get("timeout_secs").and_then(|v| v.as_integer()) {
            config.timeout_secs = timeout.max(0) as u64;
        }

        if let Some(temp) = ai_section
            .get("explanation_temperature")
            .and_then(|v| v.as_float())
        {
            config.explanation_temperature = temp as f32;
        }

        if let Some(temp) = ai_section.get("chart_temperature").and_then(|v| v.as_float()) {
            config.chart_temperature = temp as f32;
        }

        if let Some(chart) = table.get("chart").and_then(|v| v.as_table()) {
            let limits = &mut config.script_limits;
            if let Some(ops) = chart.get("max_operations").and_then(|v| v.as_integer()) {
                limits.max_operations = ops.max(0) as u64;
            }
            if let Some(ms) = chart.get("wall_clock_ms").and_then(|v| v.as_integer()) {
                limits.wall_clock_ms = ms.max(0) as u64;
            }
            if let Some(size) = chart.get("max_array_size").and_then(|v| v.as_integer()) {
                limits.max_array_size = size.max(0) as usize;
            }
        }

        Ok(config)
    }
}
