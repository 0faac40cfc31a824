//! Chart prompt synthesis
//!
//! Builds the prompt pair asking the model for plotting code about a
//! topic. The system prompt pins the dialect to Rhai and the `plt`
//! handle, asks for made-up illustrative data, and forbids prose, fences
//! and display calls.

use crate::ai::prompt::{PromptPair, DEFAULT_DOMAIN};

use super::runner::AllowedSymbols;

/// Reference card for the plotting API, embedded in the system prompt
const PLOT_API: &str = "\
plt.figure() / plt.figure(title)
plt.subplot(rows, cols, index)
plt.plot(x, y) / plt.plot(x, y, label)
plt.scatter(x, y) / plt.scatter(x, y, label)
plt.bar(categories, values) / plt.bar(categories, values, label)
plt.barh(categories, values) / plt.barh(categories, values, label)
plt.pie(values, labels)
plt.hist(values, bins)
plt.title(text), plt.xlabel(text), plt.ylabel(text)
plt.legend(), plt.grid(true), plt.xlim(lo, hi), plt.ylim(lo, hi)";

/// Prompt builder for chart-code requests
#[derive(Debug, Clone)]
pub struct CodeSynthesizer {
    domain: String,
}

impl Default for CodeSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeSynthesizer {
    pub fn new() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Prompt pair for one chart about `topic`
    pub fn build_chart_prompt(&self, topic: &str) -> PromptPair {
        let handle = AllowedSymbols::PLOT_HANDLE;
        let system = format!(
            "You are a scripting assistant helping visualize concepts related to {domain}.\n\
             Your job is to write a short, valid Rhai script that draws one simple, readable chart \
             using the `{handle}` plotting handle. `{handle}` is the only variable available.\n\n\
             Available calls:\n{api}\n\n\
             Rhai syntax: `let values = [12, 18.5, 27];` declares an array, strings use double quotes, \
             every statement ends with `;`.\n\
             Use mock or made-up numbers to illustrate trends; no real dataset is available.\n\
             Only output code. Do not include explanations, comments about the chart, or markdown fences.\n\
             Never call show, savefig, or anything that opens a window or waits for input.",
            domain = self.domain,
            handle = handle,
            api = PLOT_API,
        );

        PromptPair::new(system, format!("Create a chart about: {}", topic.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_the_handle_and_dialect() {
        let prompt = CodeSynthesizer::new().build_chart_prompt("AI in radiology");
        assert!(prompt.system.contains("`plt`"));
        assert!(prompt.system.contains("Rhai"));
        assert!(prompt.system.contains("plt.bar(categories, values)"));
    }

    #[test]
    fn prompt_forbids_prose_fences_and_display() {
        let prompt = CodeSynthesizer::new().build_chart_prompt("t");
        assert!(prompt.system.contains("Only output code"));
        assert!(prompt.system.contains("markdown fences"));
        assert!(prompt.system.contains("Never call show"));
        assert!(prompt.system.contains("made-up"));
    }

    #[test]
    fn user_prompt_carries_topic() {
        let prompt = CodeSynthesizer::new().build_chart_prompt("  Wearables and heart rhythm  ");
        assert_eq!(prompt.user, "Create a chart about: Wearables and heart rhythm");
    }

    #[test]
    fn domain_is_configurable() {
        let prompt = CodeSynthesizer::new()
            .with_domain("hospital logistics")
            .build_chart_prompt("t");
        assert!(prompt.system.contains("related to hospital logistics."));
    }
}
