//! Generated-code cleanup
//!
//! Best-effort textual cleanup of model output before execution. Removes
//! markdown fences and the display-blocking calls models habitually
//! append. This is not a security boundary; the runner's scope is.

use regex::Regex;

struct CleanupPattern {
    name: &'static str,
    regex: Regex,
}

/// Strips formatting artifacts and blocking calls from generated code
pub struct CodeSanitizer {
    patterns: Vec<CleanupPattern>,
}

impl Default for CodeSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeSanitizer {
    pub fn new() -> Self {
        let patterns = vec![
            // Whole fence lines, tagged (```rhai, ```python) or bare
            ("fence_line", r"(?m)^[ \t]*```[A-Za-z0-9_+.-]*[ \t]*\r?$\n?"),
            // Fences glued to code on the same line
            ("inline_fence", r"```[A-Za-z0-9_+.-]*"),
            // Display-blocking calls, with or without a receiver
            (
                "blocking_call",
                r"(?:\b\w+\s*\.\s*)?\b(?:show|pause|waitforbuttonpress|ginput)\s*\([^()]*\)[ \t]*;?",
            ),
        ];

        let patterns = patterns
            .into_iter()
            .filter_map(|(name, pattern)| {
                Regex::new(pattern)
                    .ok()
                    .map(|regex| CleanupPattern { name, regex })
            })
            .collect();

        Self { patterns }
    }

    /// Clean `raw` for execution. Pure; never fails.
    pub fn sanitize(&self, raw: &str) -> String {
        let mut code = raw.to_string();

        for pattern in &self.patterns {
            if pattern.regex.is_match(&code) {
                tracing::trace!("Sanitizer removed {} matches", pattern.name);
                code = pattern.regex.replace_all(&code, "").into_owned();
            }
        }

        code.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tagged_fence_and_show() {
        let raw = "```python\nplt.plot([1, 2], [3, 4]);\nplt.show()\n```";
        let clean = CodeSanitizer::new().sanitize(raw);

        assert!(!clean.contains("```"));
        assert!(!clean.contains("show"));
        assert!(!clean.contains("python"));
        assert_eq!(clean, "plt.plot([1, 2], [3, 4]);");
    }

    #[test]
    fn strips_bare_fence() {
        let raw = "```\nplt.bar([\"a\"], [1]);\n```\n";
        assert_eq!(CodeSanitizer::new().sanitize(raw), "plt.bar([\"a\"], [1]);");
    }

    #[test]
    fn strips_rhai_fence_and_bare_show() {
        let raw = "```rhai\nplt.scatter([1], [2]);\nshow();\n```";
        let clean = CodeSanitizer::new().sanitize(raw);
        assert_eq!(clean, "plt.scatter([1], [2]);");
    }

    #[test]
    fn strips_inline_fences() {
        let raw = "```rhai plt.plot([1], [1]);```";
        assert_eq!(CodeSanitizer::new().sanitize(raw), "plt.plot([1], [1]);");
    }

    #[test]
    fn strips_show_with_arguments_and_pause() {
        let raw = "plt.plot([1], [1]);\nplt.show(block=false)\nplt.pause(0.5);";
        let clean = CodeSanitizer::new().sanitize(raw);
        assert_eq!(clean, "plt.plot([1], [1]);");
    }

    #[test]
    fn strips_blocking_call_on_any_receiver() {
        let raw = "let fig = 1;\nplt.plot([1], [1]);\nfig.show();\nfig . waitforbuttonpress()";
        let clean = CodeSanitizer::new().sanitize(raw);
        assert_eq!(clean, "let fig = 1;\nplt.plot([1], [1]);");
    }

    #[test]
    fn keeps_words_containing_show() {
        let raw = "plt.title(\"Trials show progress\");\nlet slideshow = 1;";
        assert_eq!(CodeSanitizer::new().sanitize(raw), raw);
    }

    #[test]
    fn clean_code_is_unchanged() {
        let raw = "let x = [1, 2];\nplt.plot(x, x);";
        let sanitizer = CodeSanitizer::new();
        assert_eq!(sanitizer.sanitize(raw), raw);
        assert_eq!(sanitizer.sanitize(&sanitizer.sanitize(raw)), raw);
    }
}
