//! Mock Provider - Testing implementation
//!
//! Scripted AI provider for unit and integration tests without network
//! calls. Responses are served from a queue; when the queue is empty a
//! canned explanation or chart script is returned depending on the
//! request.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{AiProvider, Completion, CompletionRequest};

/// Canned explanation in the expected response shape
pub const MOCK_EXPLANATION: &str = "AI systems can analyse medical images to spot early signs of disease. \
They learn patterns from thousands of labelled examples. Doctors then review the flagged cases.\n\n\
- How image recognition works\n\
- Privacy of patient data\n\
- Human oversight of AI decisions";

/// Canned chart script using the `plt` handle
pub const MOCK_CHART_SCRIPT: &str = r#"let years = [2019, 2020, 2021, 2022, 2023];
let adoption = [12, 18, 27, 39, 52];
plt.plot(years, adoption, "Hospitals using AI triage (%)");
plt.title("AI adoption in hospitals");
plt.xlabel("Year");
plt.ylabel("Share of hospitals (%)");
plt.legend();"#;

enum Scripted {
    Text(String),
    Failure(String),
}

/// Mock AI provider for testing
pub struct MockProvider {
    /// Model name to report
    model: String,
    /// Simulated response delay in milliseconds
    delay_ms: u64,
    /// Track number of calls
    call_count: AtomicU32,
    /// Queued responses, served in order
    scripted: Arc<Mutex<Vec<Scripted>>>,
    /// Every request received
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Whether to simulate errors
    should_fail: Arc<Mutex<bool>>,
    /// Error message to return when failing
    error_message: Arc<Mutex<String>>,
}

impl MockProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self {
            model: "mock-model-v1".to_string(),
            delay_ms: 0,
            call_count: AtomicU32::new(0),
            scripted: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
            error_message: Arc::new(Mutex::new("Mock error".to_string())),
        }
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set simulated delay
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Queue a text response
    pub async fn add_response(&self, text: impl Into<String>) {
        self.scripted.lock().await.push(Scripted::Text(text.into()));
    }

    /// Queue a single failing call
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.scripted
            .lock()
            .await
            .push(Scripted::Failure(message.into()));
    }

    /// Make every call fail until reset
    pub async fn set_should_fail(&self, should_fail: bool, message: &str) {
        *self.should_fail.lock().await = should_fail;
        *self.error_message.lock().await = message.to_string();
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// Requests received so far
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// Most recent request, if any
    pub async fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().await.last().cloned()
    }

    fn generate_default(request: &CompletionRequest) -> String {
        let wants_code = request
            .system_prompt()
            .map(|s| s.contains("`plt`"))
            .unwrap_or(false);

        if wants_code {
            MOCK_CHART_SCRIPT.to_string()
        } else {
            MOCK_EXPLANATION.to_string()
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }

        if *self.should_fail.lock().await {
            let message = self.error_message.lock().await.clone();
            anyhow::bail!("{}", message);
        }

        let next = {
            let mut scripted = self.scripted.lock().await;
            if scripted.is_empty() {
                None
            } else {
                Some(scripted.remove(0))
            }
        };

        let text = match next {
            Some(Scripted::Text(text)) => text,
            Some(Scripted::Failure(message)) => anyhow::bail!("{}", message),
            None => Self::generate_default(request),
        };

        Ok(Completion {
            tokens_used: (text.len() / 4) as u32,
            response_time_ms: self.delay_ms,
            text,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        // Mock provider is always available
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::ChatMessage;

    fn request(system: &str) -> CompletionRequest {
        CompletionRequest::new(
            vec![ChatMessage::system(system), ChatMessage::user("q")],
            0.7,
        )
    }

    #[tokio::test]
    async fn serves_queue_in_order() {
        let provider = MockProvider::new();
        provider.add_response("first").await;
        provider.add_response("second").await;

        assert_eq!(provider.complete(&request("s")).await.unwrap().text, "first");
        assert_eq!(provider.complete(&request("s")).await.unwrap().text, "second");
    }

    #[tokio::test]
    async fn default_depends_on_prompt() {
        let provider = MockProvider::new();
        let explanation = provider.complete(&request("explain")).await.unwrap();
        assert_eq!(explanation.text, MOCK_EXPLANATION);

        let code = provider
            .complete(&request("use the `plt` handle"))
            .await
            .unwrap();
        assert_eq!(code.text, MOCK_CHART_SCRIPT);
    }

    #[tokio::test]
    async fn tracks_calls_and_requests() {
        let provider = MockProvider::new();
        assert_eq!(provider.call_count(), 0);

        provider.complete(&request("a")).await.unwrap();
        provider.complete(&request("b")).await.unwrap();
        assert_eq!(provider.call_count(), 2);

        let last = provider.last_request().await.unwrap();
        assert_eq!(last.system_prompt(), Some("b"));

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn can_fail() {
        let provider = MockProvider::new();
        provider.set_should_fail(true, "Simulated API error").await;

        let err = provider.complete(&request("s")).await.unwrap_err();
        assert!(err.to_string().contains("Simulated API error"));
    }

    #[tokio::test]
    async fn queued_failure_is_single_shot() {
        let provider = MockProvider::new();
        provider.add_failure("boom").await;

        assert!(provider.complete(&request("s")).await.is_err());
        assert!(provider.complete(&request("s")).await.is_ok());
    }

    #[test]
    fn name_and_model() {
        let provider = MockProvider::new().with_model("test-model-v2");
        assert_eq!(provider.name(), "Mock");
        assert_eq!(provider.model(), "test-model-v2");
    }
}
