//! Interactive follow-ups
//!
//! After an answer, offers its subtopics in a dialoguer menu and runs a
//! deeper dive on the chosen one with the same audience. Repeats until
//! the user picks "Done" or an answer has no subtopics.

use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Select};

use healthlens::{AudienceProfile, ExplanationResult, Pipeline, PipelineOutcome};

use super::report;
use crate::ui::{Printer, RequestSpinner};

const DONE: &str = "Done";

/// Whether a follow-up menu can be shown
pub fn is_interactive_available(printer: &Printer) -> bool {
    printer.mode().prompts_enabled()
}

/// Ask the user to pick one of `subtopics`. `None` means they are done.
pub fn select_subtopic(subtopics: &[String]) -> Result<Option<usize>> {
    let mut items: Vec<&str> = subtopics.iter().map(String::as_str).collect();
    items.push(DONE);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Dive deeper into")
        .items(&items)
        .default(0)
        .interact()
        .context("Subtopic selection cancelled")?;

    Ok((selection < subtopics.len()).then_some(selection))
}

/// Follow-up loop starting from the subtopics of the first answer
pub async fn deeper_dive_loop(
    pipeline: &Pipeline,
    printer: &Printer,
    audience: AudienceProfile,
    mut subtopics: Vec<String>,
    chart_out: Option<&Path>,
) -> Result<()> {
    if !is_interactive_available(printer) {
        anyhow::bail!("Interactive mode requires a TTY. Run in a terminal or drop --interactive.");
    }

    while !subtopics.is_empty() {
        printer.newline();
        let Some(idx) = select_subtopic(&subtopics)? else {
            break;
        };
        let subtopic = &subtopics[idx];
        tracing::debug!("Deeper dive: {}", subtopic);

        let mut spinner = RequestSpinner::new(printer.mode());
        spinner.start(&format!("Diving deeper into '{}'...", subtopic));
        let outcome = pipeline.deeper_dive(subtopic, audience).await?;
        spinner.finish();

        let response = match outcome {
            PipelineOutcome::Completed(response) => response,
            PipelineOutcome::Superseded => {
                printer.info("Request was replaced by a newer one");
                break;
            }
        };

        printer.newline();
        report::print_response(printer, &response, chart_out)?;

        subtopics = response
            .explanation
            .map(ExplanationResult::into_subtopics)
            .unwrap_or_default();
    }

    Ok(())
}
