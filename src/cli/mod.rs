//! CLI module - Command implementations

pub mod commands;
pub mod interactive;
pub mod report;

use healthlens::errors::InputError;

/// Output format for CLI commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Message shown by clap when an audience value does not parse
pub fn input_error_message(err: &InputError) -> String {
    match err {
        InputError::UnknownEducation { suggestion, .. }
        | InputError::UnknownTone { suggestion, .. } => format!("{}\n\n{}", err, suggestion),
        other => other.to_string(),
    }
}
