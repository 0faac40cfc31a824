//! AI Response Types - parsed explanations
//!
//! Turns the raw model answer into an explanation body plus an ordered
//! list of follow-up subtopics, using the line conventions in
//! [`schema`](super::schema).

use serde::{Deserialize, Deserializer, Serialize};

use super::schema;

/// Explanation body plus follow-up subtopics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplanationResult {
    /// Explanation paragraph, lines joined with single spaces
    body: String,
    /// Follow-up subtopics, at most [`schema::MAX_SUBTOPICS`]
    #[serde(deserialize_with = "deserialize_subtopics")]
    subtopics: Vec<String>,
    /// Provider and timing information
    #[serde(default)]
    pub metadata: ExplanationMetadata,
}

impl ExplanationResult {
    pub fn new(body: impl Into<String>, subtopics: Vec<String>) -> Self {
        let mut subtopics = subtopics;
        subtopics.truncate(schema::MAX_SUBTOPICS);
        Self {
            body: body.into(),
            subtopics,
            metadata: ExplanationMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ExplanationMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn subtopics(&self) -> &[String] {
        &self.subtopics
    }

    pub fn into_subtopics(self) -> Vec<String> {
        self.subtopics
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn has_subtopics(&self) -> bool {
        !self.subtopics.is_empty()
    }
}

fn deserialize_subtopics<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut subtopics = Vec::<String>::deserialize(deserializer)?;
    subtopics.truncate(schema::MAX_SUBTOPICS);
    Ok(subtopics)
}

/// Metadata about how an explanation was generated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplanationMetadata {
    /// Provider name
    pub provider: String,
    /// Model identifier
    pub model: String,
    /// Tokens used, when the provider reports them
    pub tokens_used: u32,
    /// Response time in milliseconds
    pub response_time_ms: u64,
    /// RFC 3339 generation timestamp
    pub generated_at: String,
    /// Response schema version
    pub schema_version: String,
}

impl ExplanationMetadata {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            tokens_used: 0,
            response_time_ms: 0,
            generated_at: chrono::Utc::now().to_rfc3339(),
            schema_version: schema::SCHEMA_VERSION.to_string(),
        }
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens_used = tokens;
        self
    }

    pub fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = ms;
        self
    }
}

/// Line classifier for raw model answers
pub struct ResponseParser;

impl ResponseParser {
    /// Parse raw model text.
    ///
    /// Bullet-marked lines become subtopics (first three kept); every other
    /// non-blank line is part of the body. Empty input yields an empty
    /// result; deciding whether that is a failure is up to the caller.
    pub fn parse(raw: &str) -> ExplanationResult {
        let mut body_lines = Vec::new();
        let mut subtopics = Vec::new();

        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if schema::is_bullet(trimmed) {
                let topic = strip_marker(trimmed);
                if !topic.is_empty() {
                    subtopics.push(topic.to_string());
                }
            } else {
                body_lines.push(trimmed);
            }
        }

        ExplanationResult::new(body_lines.join(" "), subtopics)
    }
}

/// Remove leading markers and the whitespace around them
fn strip_marker(line: &str) -> &str {
    line.trim_start_matches(|c: char| schema::BULLET_MARKERS.contains(&c) || c.is_whitespace())
        .trim_end()
}
