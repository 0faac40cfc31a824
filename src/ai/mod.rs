//! AI Module - audience-tailored explanations
//!
//! Builds prompts from an audience profile, calls a language-model
//! provider (OpenAI, Anthropic, Ollama) and parses the answer into an
//! explanation body plus follow-up subtopics.
//!
//! # Example
//!
//! ```rust,ignore
//! use healthlens::ai::{AiConfig, AudienceProfile, ExplanationService};
//!
//! let mut config = AiConfig::default();
//! config.load_api_key_from_env();
//! config.validate()?;
//!
//! let service = ExplanationService::new(&config)?;
//! let result = service
//!     .explain("How is AI used in cancer screening?", &AudienceProfile::default())
//!     .await?;
//! println!("{}", result.body());
//! ```

pub mod audience;
pub mod config;
pub mod engine;
pub mod prompt;
pub mod provider;
pub mod response;
pub mod schema;

pub use audience::{AudienceNote, AudienceProfile, EducationLevel, Tone};
pub use config::{AiConfig, AiProvider as AiProviderType, ConfigSource};
pub use engine::{EngineStats, ExplanationService};
pub use prompt::{PromptBuilder, PromptPair};
pub use provider::{AiProvider, ChatMessage, Completion, CompletionRequest, MockProvider};
pub use response::{ExplanationMetadata, ExplanationResult, ResponseParser};
