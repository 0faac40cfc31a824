//! Spinner shown while model requests are in flight
//!
//! Draws nothing unless the output mode allows progress output.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::OutputMode;

/// Indeterminate progress for one request
pub struct RequestSpinner {
    bar: Option<ProgressBar>,
    mode: OutputMode,
}

impl RequestSpinner {
    pub fn new(mode: OutputMode) -> Self {
        Self { bar: None, mode }
    }

    /// Start spinning with `message`
    pub fn start(&mut self, message: &str) {
        if !self.mode.progress_enabled() {
            return;
        }

        let bar = ProgressBar::new_spinner();
        let unicode = self.mode.unicode_enabled();

        let template = if unicode {
            "{spinner:.cyan} {msg} {elapsed:.dim}"
        } else {
            "[{elapsed}] {msg}"
        };
        let tick_chars = if unicode {
            "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"
        } else {
            "-\\|/"
        };

        let style = ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(tick_chars);

        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        self.bar = Some(bar);
    }

    /// Clear the spinner so regular output can follow
    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for RequestSpinner {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar {
            if !bar.is_finished() {
                bar.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_disabled_outside_terminal() {
        let mut spinner = RequestSpinner::new(OutputMode::Plain);
        spinner.start("Thinking...");
        assert!(spinner.bar.is_none());
        spinner.finish();
    }

    #[test]
    fn ci_mode_has_no_spinner() {
        let mut spinner = RequestSpinner::new(OutputMode::CI);
        spinner.start("Drawing chart...");
        assert!(spinner.bar.is_none());
    }
}
