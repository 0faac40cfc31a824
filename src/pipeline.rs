//! Request pipeline - explanation and chart for one user interaction
//!
//! Runs the explanation half and the chart half concurrently. The halves
//! fail independently. Submitting a new request aborts the one still in
//! flight: supersede, don't queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::{AbortHandle, JoinHandle};

use crate::ai::audience::AudienceProfile;
use crate::ai::config::AiConfig;
use crate::ai::engine::ExplanationService;
use crate::ai::provider::{create_provider, AiProvider};
use crate::ai::response::ExplanationResult;
use crate::chart::executor::{ChartExecutor, ChartResult};
use crate::errors::{ChartError, GenerationError, InputError};

/// A question plus the audience it is for
#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationRequest {
    question: String,
    audience: AudienceProfile,
}

impl ExplanationRequest {
    pub fn new(question: &str, audience: AudienceProfile) -> Result<Self, InputError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(InputError::EmptyQuestion);
        }
        Ok(Self {
            question: question.to_string(),
            audience,
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn audience(&self) -> &AudienceProfile {
        &self.audience
    }
}

/// Topic of one chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    topic: String,
}

impl ChartRequest {
    pub fn new(topic: &str) -> Result<Self, InputError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(InputError::EmptyTopic);
        }
        Ok(Self {
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Everything one submission asks for
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub explanation: ExplanationRequest,
    pub chart: Option<ChartRequest>,
}

impl PipelineRequest {
    /// Explanation plus a chart about the same question
    pub fn new(question: &str, audience: AudienceProfile) -> Result<Self, InputError> {
        Ok(Self {
            explanation: ExplanationRequest::new(question, audience)?,
            chart: Some(ChartRequest::new(question)?),
        })
    }

    /// Drop the chart half
    pub fn without_chart(mut self) -> Self {
        self.chart = None;
        self
    }
}

/// Both halves of a finished request
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResponse {
    pub question: String,
    #[serde(serialize_with = "serialize_explanation")]
    pub explanation: Result<ExplanationResult, GenerationError>,
    pub chart: Option<ChartResult>,
}

fn serialize_explanation<S: serde::Serializer>(
    explanation: &Result<ExplanationResult, GenerationError>,
    s: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;

    let mut map = s.serialize_map(Some(2))?;
    match explanation {
        Ok(result) => {
            map.serialize_entry("status", "success")?;
            map.serialize_entry("result", result)?;
        }
        Err(e) => {
            map.serialize_entry("status", "failure")?;
            map.serialize_entry("error", &e.to_string())?;
        }
    }
    map.end()
}

/// What awaiting a [`RequestHandle`] yields
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed(PipelineResponse),
    /// A newer submission replaced this one
    Superseded,
}

impl PipelineOutcome {
    pub fn into_response(self) -> Option<PipelineResponse> {
        match self {
            PipelineOutcome::Completed(response) => Some(response),
            PipelineOutcome::Superseded => None,
        }
    }
}

/// A submitted request
#[derive(Debug)]
pub struct RequestHandle {
    id: u64,
    question: String,
    task: JoinHandle<PipelineResponse>,
}

impl RequestHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the request to finish or be superseded
    pub async fn outcome(self) -> PipelineOutcome {
        match self.task.await {
            Ok(response) => PipelineOutcome::Completed(response),
            Err(e) if e.is_cancelled() => {
                tracing::debug!("Request {} superseded", self.id);
                PipelineOutcome::Superseded
            }
            Err(e) => {
                tracing::error!("Request {} task failed: {}", self.id, e);
                let detail = format!("request task failed: {}", e);
                PipelineOutcome::Completed(PipelineResponse {
                    question: self.question,
                    explanation: Err(GenerationError::Provider {
                        detail: detail.clone(),
                    }),
                    chart: Some(ChartResult::failure(ChartError::execution(detail))),
                })
            }
        }
    }
}

/// Runs explanation and chart requests for one interactive session
pub struct Pipeline {
    explainer: Arc<ExplanationService>,
    charts: Arc<ChartExecutor>,
    in_flight: Mutex<Option<AbortHandle>>,
    next_id: AtomicU64,
}

impl Pipeline {
    /// Build both services on one provider described by `config`
    pub fn new(config: &AiConfig) -> Result<Self> {
        let provider: Arc<dyn AiProvider> = Arc::from(create_provider(config)?);
        Ok(Self::with_provider(provider, config))
    }

    pub fn with_provider(provider: Arc<dyn AiProvider>, config: &AiConfig) -> Self {
        Self::with_parts(
            Arc::new(ExplanationService::with_provider(Arc::clone(&provider), config)),
            Arc::new(ChartExecutor::with_provider(provider, config)),
        )
    }

    pub fn with_parts(explainer: Arc<ExplanationService>, charts: Arc<ChartExecutor>) -> Self {
        Self {
            explainer,
            charts,
            in_flight: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn explainer(&self) -> &ExplanationService {
        &self.explainer
    }

    pub fn charts(&self) -> &ChartExecutor {
        &self.charts
    }

    /// Start `request`, aborting whatever was still running
    pub fn submit(&self, request: PipelineRequest) -> RequestHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let question = request.explanation.question().to_string();
        let explainer = Arc::clone(&self.explainer);
        let charts = Arc::clone(&self.charts);

        let task = tokio::spawn(async move {
            let PipelineRequest { explanation, chart } = request;
            tracing::info!("Request {}: {}", id, explanation.question());

            let explain = explainer.explain(explanation.question(), explanation.audience());
            let render = async {
                match &chart {
                    Some(chart) => Some(charts.render(chart.topic()).await),
                    None => None,
                }
            };
            let (explanation_result, chart_result) = tokio::join!(explain, render);

            PipelineResponse {
                question: explanation.question().to_string(),
                explanation: explanation_result,
                chart: chart_result,
            }
        });

        if let Some(previous) = self.in_flight.lock().replace(task.abort_handle()) {
            if !previous.is_finished() {
                tracing::debug!("Superseding in-flight request");
            }
            previous.abort();
        }

        RequestHandle { id, question, task }
    }

    /// Submit and wait
    pub async fn run(&self, request: PipelineRequest) -> PipelineOutcome {
        self.submit(request).outcome().await
    }

    /// Re-run both halves for a follow-up subtopic with the same audience
    pub async fn deeper_dive(
        &self,
        subtopic: &str,
        audience: AudienceProfile,
    ) -> Result<PipelineOutcome, InputError> {
        let request = PipelineRequest::new(subtopic, audience)?;
        Ok(self.run(request).await)
    }

    /// Abort the in-flight request, if any
    pub fn cancel(&self) {
        if let Some(handle) = self.in_flight.lock().take() {
            handle.abort();
        }
    }
}
