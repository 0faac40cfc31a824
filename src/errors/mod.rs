//! Error taxonomy with miette diagnostics
//!
//! Every fault that can reach a caller is one of these typed errors.
//! `ExplanationService` and `ChartExecutor` are the only fault boundaries:
//! they convert provider, timeout and script failures into
//! [`GenerationError`] and [`ChartError`] respectively.

pub mod suggestions;

use miette::Diagnostic;
use thiserror::Error;

/// Startup configuration problems. Fatal, never retried.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// The model-provider credential is not available
    #[error("Missing model provider credential: {var_name}")]
    #[diagnostic(
        code(healthlens::config::missing_credential),
        help("Set the environment variable before starting:\n  export {var_name}=<key>\n\nOr switch to a local model with --provider ollama")
    )]
    MissingCredential { var_name: String },

    /// A configuration value is out of range
    #[error("Invalid configuration value for '{field}': {reason}")]
    #[diagnostic(code(healthlens::config::invalid))]
    InvalidValue { field: String, reason: String },

    /// The config file exists but could not be read
    #[error("Failed to read config file {path}: {message}")]
    #[diagnostic(code(healthlens::config::read))]
    FileRead { path: String, message: String },

    /// The config file is not valid TOML
    #[error("Failed to parse config file {path}: {message}")]
    #[diagnostic(
        code(healthlens::config::parse),
        help("The file must contain an [ai] table, e.g.\n\n[ai]\nprovider = \"openai\"\nmodel = \"gpt-4o\"")
    )]
    FileParse { path: String, message: String },
}

impl ConfigError {
    pub fn missing_credential(var_name: impl Into<String>) -> Self {
        Self::MissingCredential {
            var_name: var_name.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Explanation generation failed. Recoverable: the caller may retry.
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum GenerationError {
    /// The model call raised or returned an unusable envelope
    #[error("Explanation request failed: {detail}")]
    #[diagnostic(code(healthlens::generation::provider))]
    Provider { detail: String },

    /// The model call did not finish within the configured bound
    #[error("Explanation request timed out after {millis}ms")]
    #[diagnostic(
        code(healthlens::generation::timeout),
        help("Increase the bound with --timeout <seconds>")
    )]
    Timeout { millis: u64 },

    /// The model answered with nothing usable as an explanation body
    #[error("The model returned an empty explanation")]
    #[diagnostic(code(healthlens::generation::empty))]
    EmptyResponse,
}

impl GenerationError {
    pub fn provider(err: &anyhow::Error) -> Self {
        Self::Provider {
            detail: format!("{:#}", err),
        }
    }
}

/// Chart generation failed. Independent per chart request.
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum ChartError {
    /// The code-generation model call failed or timed out
    #[error("Chart code request failed: {detail}")]
    #[diagnostic(code(healthlens::chart::provider))]
    ProviderFailure { detail: String },

    /// The generated code raised, did not parse, or hit a resource limit
    #[error("Generated chart code failed: {detail}")]
    #[diagnostic(code(healthlens::chart::execution))]
    ExecutionFault { detail: String },

    /// The code ran but never drew anything
    #[error("The generated code did not create a visible chart")]
    #[diagnostic(
        code(healthlens::chart::no_visual),
        help("The script computed data without plotting it; try rephrasing the topic")
    )]
    NoVisualElement,
}

impl ChartError {
    pub fn provider(err: &anyhow::Error) -> Self {
        Self::ProviderFailure {
            detail: format!("{:#}", err),
        }
    }

    pub fn execution(detail: impl Into<String>) -> Self {
        Self::ExecutionFault {
            detail: detail.into(),
        }
    }
}

/// Invalid user input while building request values
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum InputError {
    #[error("The question must not be empty")]
    #[diagnostic(code(healthlens::input::empty_question))]
    EmptyQuestion,

    #[error("The chart topic must not be empty")]
    #[diagnostic(code(healthlens::input::empty_topic))]
    EmptyTopic,

    #[error("Unknown education level: '{value}'")]
    #[diagnostic(code(healthlens::input::education), help("{suggestion}"))]
    UnknownEducation { value: String, suggestion: String },

    #[error("Unknown tone: '{value}'")]
    #[diagnostic(code(healthlens::input::tone), help("{suggestion}"))]
    UnknownTone { value: String, suggestion: String },
}

impl InputError {
    pub fn unknown_education(value: impl Into<String>) -> Self {
        let value = value.into();
        let suggestion = suggestions::suggest_education(&value);
        Self::UnknownEducation { value, suggestion }
    }

    pub fn unknown_tone(value: impl Into<String>) -> Self {
        let value = value.into();
        let suggestion = suggestions::suggest_tone(&value);
        Self::UnknownTone { value, suggestion }
    }
}

/// Add a contextual hint to an error bubbling out of the binary
pub fn format_error(err: &anyhow::Error) -> String {
    let err_lower = err.to_string().to_lowercase();

    if err_lower.contains("credential") || err_lower.contains("api key") {
        format!("{}\n\nHint: Run 'healthlens doctor' to check your environment", err)
    } else if err_lower.contains("timed out") {
        format!("{}\n\nHint: Try increasing timeout with --timeout <seconds>", err)
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_variable() {
        let err = ConfigError::missing_credential("OPENAI_API_KEY");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn generation_error_keeps_provider_chain() {
        let inner = anyhow::anyhow!("HTTP 500").context("Failed to send request");
        let err = GenerationError::provider(&inner);
        match err {
            GenerationError::Provider { detail } => {
                assert!(detail.contains("Failed to send request"));
                assert!(detail.contains("HTTP 500"));
            }
            other => panic!("Expected Provider, got {:?}", other),
        }
    }

    #[test]
    fn chart_error_variants_display() {
        let errors = vec![
            ChartError::ProviderFailure {
                detail: "down".to_string(),
            },
            ChartError::execution("Function not found: show"),
            ChartError::NoVisualElement,
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
        }
        assert!(ChartError::NoVisualElement
            .to_string()
            .contains("visible chart"));
    }

    #[test]
    fn unknown_education_suggests_close_match() {
        let err = InputError::unknown_education("Univrsity");
        if let InputError::UnknownEducation { suggestion, .. } = err {
            assert!(suggestion.contains("University"));
        } else {
            panic!("Expected UnknownEducation");
        }
    }

    #[test]
    fn format_error_adds_timeout_hint() {
        let err = anyhow::anyhow!("Explanation request timed out after 60s");
        assert!(format_error(&err).contains("--timeout"));
    }
}
