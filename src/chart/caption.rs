//! Deterministic chart captions
//!
//! Captions are built from the topic alone, never by a model call, so a
//! chart that rendered always has a caption.

/// Column width captions are wrapped to
pub const CAPTION_WIDTH: usize = 80;

/// Caption for a chart about `topic`, wrapped at [`CAPTION_WIDTH`]
pub fn caption_for(topic: &str) -> String {
    let text = format!(
        "This graph supports the topic: '{}'. It visualizes one aspect of how AI can be \
         applied in this area using simplified, illustrative data.",
        topic.trim()
    );
    textwrap::fill(&text, CAPTION_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_mentions_topic() {
        let caption = caption_for("AI triage in emergency rooms");
        assert!(caption.starts_with("This graph supports the topic: 'AI triage in emergency rooms'."));
        assert!(caption.contains("illustrative data."));
    }

    #[test]
    fn caption_is_deterministic() {
        assert_eq!(caption_for("Wearables"), caption_for("Wearables"));
    }

    #[test]
    fn caption_wraps_at_80_columns() {
        let caption = caption_for("How machine learning predicts hospital readmissions for chronic patients");
        let lines: Vec<&str> = caption.lines().collect();

        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.chars().count() <= CAPTION_WIDTH));
        // Wrapping only replaces spaces with newlines
        assert_eq!(
            caption.replace('\n', " "),
            format!(
                "This graph supports the topic: '{}'. It visualizes one aspect of how AI can be \
                 applied in this area using simplified, illustrative data.",
                "How machine learning predicts hospital readmissions for chronic patients"
            )
        );
    }
}
