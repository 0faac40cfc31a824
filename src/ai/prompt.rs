//! Prompt Templates - audience-tailored explanation prompts
//!
//! Builds the system/user prompt pair for an explanation request.
//! Tone and audience note are independent dimensions: both are always
//! present in the system prompt.

use super::audience::AudienceProfile;
use super::provider::ChatMessage;
use super::schema;

/// Subject area the assistant explains
pub const DEFAULT_DOMAIN: &str = "how AI is used in health";

/// A system prompt and the user prompt that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Ordered chat messages: system first, then user
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

/// Prompt builder for explanation requests
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    domain: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
        }
    }

    /// Override the subject area named in the persona
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Build the prompt pair for a question and audience
    pub fn build(&self, question: &str, audience: &AudienceProfile) -> PromptPair {
        let (min_topics, max_topics) = schema::REQUESTED_SUBTOPICS;

        let system = format!(
            "You are an expert science communicator helping the public understand {domain}.\n\
             Your job is to answer the user's question clearly and give {min_topics}–{max_topics} related subtopics to explore further.\n\n\
             {tone}\n\
             {note}\n\n\
             {format}",
            domain = self.domain,
            tone = audience.tone.instruction(),
            note = audience.note().instruction(),
            format = schema::format_instructions(),
        );

        PromptPair::new(system, format!("User question: {}", question.trim()))
    }
}
