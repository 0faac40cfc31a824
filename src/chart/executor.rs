//! Chart Executor - topic in, chart or typed failure out
//!
//! Requests plotting code from the model, sanitizes it, runs it against
//! the ambient [`ChartContext`] and checks that something was drawn. This
//! is the second fault boundary of the crate: every failure is returned
//! as [`ChartResult::Failure`] data.
//!
//! The context is held behind an async mutex for the whole
//! reset → execute → capture sequence, so concurrent renders are
//! serialized and never see each other's figures. The model call happens
//! before the lock is taken.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::ai::config::AiConfig;
use crate::ai::provider::{create_provider, AiProvider, CompletionRequest};
use crate::errors::ChartError;

use super::caption::caption_for;
use super::context::ChartContext;
use super::figure::Figure;
use super::runner::{AllowedSymbols, CodeRunner, ExecutionOutcome, RhaiRunner};
use super::sanitize::CodeSanitizer;
use super::synth::CodeSynthesizer;

/// Outcome of one chart request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartResult {
    /// A drawable figure; ownership passes to the caller
    Success { figure: Figure, caption: String },
    /// Why no chart was produced
    Failure {
        #[serde(serialize_with = "serialize_error")]
        error: ChartError,
    },
}

fn serialize_error<S: serde::Serializer>(error: &ChartError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&error.to_string())
}

impl ChartResult {
    pub fn failure(error: ChartError) -> Self {
        ChartResult::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ChartResult::Success { .. })
    }

    pub fn figure(&self) -> Option<&Figure> {
        match self {
            ChartResult::Success { figure, .. } => Some(figure),
            ChartResult::Failure { .. } => None,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            ChartResult::Success { caption, .. } => Some(caption),
            ChartResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ChartError> {
        match self {
            ChartResult::Success { .. } => None,
            ChartResult::Failure { error } => Some(error),
        }
    }

    /// Failure message, if this is a failure
    pub fn message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    pub fn into_result(self) -> Result<(Figure, String), ChartError> {
        match self {
            ChartResult::Success { figure, caption } => Ok((figure, caption)),
            ChartResult::Failure { error } => Err(error),
        }
    }
}

/// Renders charts for topics via model-generated code
pub struct ChartExecutor {
    provider: Arc<dyn AiProvider>,
    synthesizer: CodeSynthesizer,
    sanitizer: CodeSanitizer,
    runner: Arc<dyn CodeRunner>,
    context: Arc<Mutex<ChartContext>>,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl ChartExecutor {
    /// Create an executor with the provider described by `config`
    pub fn new(config: &AiConfig) -> Result<Self> {
        let provider = create_provider(config)?;
        Ok(Self::with_provider(Arc::from(provider), config))
    }

    /// Create an executor around an existing provider
    pub fn with_provider(provider: Arc<dyn AiProvider>, config: &AiConfig) -> Self {
        Self {
            provider,
            synthesizer: CodeSynthesizer::new(),
            sanitizer: CodeSanitizer::new(),
            runner: Arc::new(RhaiRunner::new(config.script_limits)),
            context: Arc::new(Mutex::new(ChartContext::new())),
            timeout: config.timeout(),
            temperature: config.chart_temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Swap the interpreter
    pub fn with_runner(mut self, runner: Arc<dyn CodeRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Render a chart about `topic`
    pub async fn render(&self, topic: &str) -> ChartResult {
        let raw = match self.request_code(topic).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!("Chart failed for '{}': {}", topic, error);
                return ChartResult::failure(error);
            }
        };

        self.render_code(topic, &raw).await
    }

    /// Sanitize and run already-generated code for `topic`
    pub async fn render_code(&self, topic: &str, raw_code: &str) -> ChartResult {
        tracing::debug!("Generated chart code for '{}':\n{}", topic, raw_code);
        let code = self.sanitizer.sanitize(raw_code);
        tracing::trace!("Sanitized chart code:\n{}", code);

        let result = match self.execute(code).await {
            Ok(figure) => ChartResult::Success {
                figure,
                caption: caption_for(topic),
            },
            Err(error) => ChartResult::failure(error),
        };

        if let Some(error) = result.error() {
            tracing::warn!("Chart failed for '{}': {}", topic, error);
        }
        result
    }

    async fn request_code(&self, topic: &str) -> Result<String, ChartError> {
        let prompt = self.synthesizer.build_chart_prompt(topic);
        let request = CompletionRequest::new(prompt.messages(), self.temperature)
            .with_max_tokens(self.max_tokens);

        match tokio::time::timeout(self.timeout, self.provider.complete(&request)).await {
            Ok(Ok(completion)) => Ok(completion.text),
            Ok(Err(e)) => Err(ChartError::provider(&e)),
            Err(_) => Err(ChartError::ProviderFailure {
                detail: format!("timed out after {}ms", self.timeout.as_millis()),
            }),
        }
    }

    /// reset → execute → capture under the context lock, on a blocking thread
    async fn execute(&self, code: String) -> Result<Figure, ChartError> {
        let context = Arc::clone(&self.context).lock_owned().await;
        let runner = Arc::clone(&self.runner);

        let (outcome, figure) = tokio::task::spawn_blocking(move || {
            context.reset();
            let symbols = AllowedSymbols::plotting(context.handle());
            let outcome = runner.execute(&code, &symbols);
            (outcome, context.capture())
        })
        .await
        .map_err(|e| ChartError::execution(format!("chart worker failed: {}", e)))?;

        match outcome {
            ExecutionOutcome::Faulted { kind, message } => Err(ChartError::execution(format!(
                "{}: {}",
                kind.as_str(),
                message
            ))),
            ExecutionOutcome::Completed { operations } => {
                tracing::debug!(
                    "Chart script completed: {} operations, {} elements",
                    operations,
                    figure.element_count()
                );
                if figure.is_drawable() {
                    Ok(figure)
                } else {
                    Err(ChartError::NoVisualElement)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::MOCK_CHART_SCRIPT;
    use crate::ai::provider::MockProvider;

    fn executor(provider: Arc<MockProvider>) -> ChartExecutor {
        ChartExecutor::with_provider(provider, &AiConfig::ollama())
    }

    #[tokio::test]
    async fn renders_mock_script() {
        let provider = Arc::new(MockProvider::new());
        let result = executor(provider).render("AI triage").await;

        assert!(result.is_success(), "{:?}", result.message());
        assert!(result.caption().unwrap().contains("'AI triage'"));
        assert!(result.figure().unwrap().is_drawable());
    }

    #[tokio::test]
    async fn uses_chart_temperature_and_handle_prompt() {
        let provider = Arc::new(MockProvider::new());
        executor(provider.clone()).render("t").await;

        let request = provider.last_request().await.unwrap();
        assert!((request.temperature - 0.6).abs() < f32::EPSILON);
        assert!(request.system_prompt().unwrap().contains("`plt`"));
    }

    #[tokio::test]
    async fn fenced_code_with_show_still_renders() {
        let provider = Arc::new(MockProvider::new());
        provider
            .add_response(format!("```rhai\n{}\nplt.show();\n```", MOCK_CHART_SCRIPT))
            .await;

        assert!(executor(provider).render("t").await.is_success());
    }

    #[tokio::test]
    async fn data_only_code_is_no_visual_element() {
        let provider = Arc::new(MockProvider::new());
        provider
            .add_response("let years = [2020, 2021]; let values = [1, 2];")
            .await;

        let result = executor(provider).render("t").await;
        assert_eq!(result.error(), Some(&ChartError::NoVisualElement));
    }

    #[tokio::test]
    async fn decorations_only_is_no_visual_element() {
        let executor = executor(Arc::new(MockProvider::new()));
        let result = executor
            .render_code("t", "plt.title(\"Empty\"); plt.xlabel(\"x\");")
            .await;
        assert_eq!(result.error(), Some(&ChartError::NoVisualElement));
    }

    #[tokio::test]
    async fn script_error_is_execution_fault() {
        let executor = executor(Arc::new(MockProvider::new()));
        let result = executor
            .render_code("t", "plt.plot([1, 2], [1, 2]); plt.savefig(\"out.png\");")
            .await;

        match result.error() {
            Some(ChartError::ExecutionFault { detail }) => assert!(detail.contains("savefig")),
            other => panic!("Expected ExecutionFault, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn provider_failure_is_chart_error() {
        let provider = Arc::new(MockProvider::new());
        provider.set_should_fail(true, "HTTP 503").await;

        let result = executor(provider).render("t").await;
        match result.error() {
            Some(ChartError::ProviderFailure { detail }) => assert!(detail.contains("503")),
            other => panic!("Expected ProviderFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let provider = Arc::new(MockProvider::new().with_delay(500));
        let result = executor(provider)
            .with_timeout(Duration::from_millis(20))
            .render("t")
            .await;

        match result.error() {
            Some(ChartError::ProviderFailure { detail }) => {
                assert_eq!(detail, "timed out after 20ms")
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn sequential_renders_do_not_leak() {
        let executor = executor(Arc::new(MockProvider::new()));

        let first = executor
            .render_code("a", "plt.bar([\"x\", \"y\"], [1, 2]); plt.title(\"First\");")
            .await;
        let second = executor
            .render_code("b", "plt.scatter([1, 2, 3], [3, 2, 1]);")
            .await;

        let figure = second.figure().unwrap();
        assert_eq!(figure.element_count(), 1);
        assert_eq!(figure.axes.len(), 1);
        assert!(figure.axes[0].title.is_none());
        assert_eq!(first.figure().unwrap().axes[0].title.as_deref(), Some("First"));
    }

    #[test]
    fn failure_serializes_as_message() {
        let json = serde_json::to_value(ChartResult::failure(ChartError::NoVisualElement)).unwrap();
        assert_eq!(json["status"], "failure");
        assert!(json["error"].as_str().unwrap().contains("visible chart"));
    }
}
