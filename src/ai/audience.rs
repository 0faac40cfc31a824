//! Audience Profile - who the explanation is written for
//!
//! Age, education level and tone steer prompt phrasing only. They are
//! never validated beyond enum membership.

use serde::{Deserialize, Serialize};

use crate::errors::InputError;

/// Highest completed (or current) level of education
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EducationLevel {
    Primary,
    Secondary,
    #[default]
    University,
    #[serde(rename = "PhD")]
    PhD,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 4] = [
        EducationLevel::Primary,
        EducationLevel::Secondary,
        EducationLevel::University,
        EducationLevel::PhD,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Primary => "Primary",
            EducationLevel::Secondary => "Secondary",
            EducationLevel::University => "University",
            EducationLevel::PhD => "PhD",
        }
    }

    /// Primary or secondary schooling
    pub fn is_school(&self) -> bool {
        matches!(self, EducationLevel::Primary | EducationLevel::Secondary)
    }

    /// University or doctoral education
    pub fn is_higher(&self) -> bool {
        matches!(self, EducationLevel::University | EducationLevel::PhD)
    }
}

impl std::fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EducationLevel {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(EducationLevel::Primary),
            "secondary" | "high-school" | "highschool" => Ok(EducationLevel::Secondary),
            "university" | "college" => Ok(EducationLevel::University),
            "phd" | "doctorate" => Ok(EducationLevel::PhD),
            _ => Err(InputError::unknown_education(s)),
        }
    }
}

/// Register of the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Simple and engaging, for a general audience
    #[default]
    Informative,
    /// Precise, assumes scientific literacy
    Technical,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Informative => "informative",
            Tone::Technical => "technical",
        }
    }

    /// Prompt instruction for this register
    pub fn instruction(&self) -> &'static str {
        match self {
            Tone::Informative => {
                "Use a simple, clear, and engaging tone suitable for a general audience. \
                 Avoid jargon and explain concepts as if to a curious student."
            }
            Tone::Technical => {
                "Use a precise and technical tone suitable for an educated reader \
                 familiar with scientific terminology."
            }
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Tone {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "informative" | "simple" => Ok(Tone::Informative),
            "technical" | "precise" => Ok(Tone::Technical),
            _ => Err(InputError::unknown_tone(s)),
        }
    }
}

/// Content simplification note, chosen by the first matching rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceNote {
    /// age < 16
    ChildOrTeen,
    /// age < 25 with primary or secondary education
    YoungSchool,
    /// university or PhD
    Advanced,
    /// everyone else
    Default,
}

impl AudienceNote {
    /// Select the note for a profile. Rules are evaluated in priority order.
    pub fn select(age: u32, education: EducationLevel) -> Self {
        if age < 16 {
            AudienceNote::ChildOrTeen
        } else if age < 25 && education.is_school() {
            AudienceNote::YoungSchool
        } else if education.is_higher() {
            AudienceNote::Advanced
        } else {
            AudienceNote::Default
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            AudienceNote::ChildOrTeen => {
                "Explain the topic in very simple terms, suitable for a child or teenager."
            }
            AudienceNote::YoungSchool => {
                "Explain the topic in simple and relatable terms, avoiding technical words."
            }
            AudienceNote::Advanced => {
                "Feel free to include moderate to advanced technical details."
            }
            AudienceNote::Default => "Keep the explanation clear and easy to follow.",
        }
    }
}

/// The triple of age, education level and tone for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceProfile {
    pub age: u32,
    pub education: EducationLevel,
    pub tone: Tone,
}

impl Default for AudienceProfile {
    fn default() -> Self {
        Self {
            age: 30,
            education: EducationLevel::University,
            tone: Tone::Informative,
        }
    }
}

impl AudienceProfile {
    pub fn new(age: u32, education: EducationLevel, tone: Tone) -> Self {
        Self {
            age,
            education,
            tone,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    pub fn with_education(mut self, education: EducationLevel) -> Self {
        self.education = education;
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn note(&self) -> AudienceNote {
        AudienceNote::select(self.age, self.education)
    }
}
