//! healthlens - audience-tailored explanations and illustrative charts
//!
//! Answers questions about AI in health with a short explanation shaped by
//! the reader's age, education and preferred tone, plus up to three
//! follow-up subtopics. Alongside the explanation a model writes a small
//! plotting script that runs in a sandboxed interpreter to produce an
//! illustrative chart.
//!
//! # Modules
//!
//! - `ai` - providers, prompt construction, explanation service
//! - `chart` - code synthesis, sanitization, sandboxed execution, SVG export
//! - `pipeline` - runs both halves of a request concurrently
//! - `errors` - typed errors for each fault boundary
//!
//! # Example
//!
//! ```rust,ignore
//! use healthlens::{AiConfig, AudienceProfile, Pipeline, PipelineRequest};
//!
//! let config = AiConfig::ollama();
//! let pipeline = Pipeline::new(&config)?;
//!
//! let request = PipelineRequest::new("How does AI read X-rays?", AudienceProfile::default())?;
//! if let Some(response) = pipeline.run(request).await.into_response() {
//!     println!("{}", response.explanation?.body());
//! }
//! ```

pub mod ai;
pub mod chart;
pub mod errors;
pub mod pipeline;

// Re-export commonly used types
pub use ai::{
    AiConfig, AudienceProfile, EducationLevel, ExplanationResult, ExplanationService, Tone,
};
pub use chart::{ChartExecutor, ChartResult, Figure};
pub use errors::{ChartError, ConfigError, GenerationError, InputError};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineRequest, PipelineResponse};
