//! Output Schema - the response shape shared by prompt and parser
//!
//! `PromptBuilder` tells the model to answer in this shape and
//! `ResponseParser` classifies lines by it. Both read these constants,
//! so a change here moves them together.

/// Bump whenever the instructions or the line classification change
pub const SCHEMA_VERSION: &str = "1.0";

/// Line prefixes that mark a follow-up subtopic
pub const BULLET_MARKERS: [char; 2] = ['-', '•'];

/// The marker the model is asked to use
pub const PREFERRED_MARKER: char = BULLET_MARKERS[0];

/// Subtopics beyond this count are discarded
pub const MAX_SUBTOPICS: usize = 3;

/// Subtopics the model is asked to produce
pub const REQUESTED_SUBTOPICS: (usize, usize) = (2, MAX_SUBTOPICS);

/// Sentence bounds of the answer paragraph
pub const PARAGRAPH_SENTENCES: (usize, usize) = (3, 5);

/// Whether a line starts with a subtopic marker once trimmed
pub fn is_bullet(line: &str) -> bool {
    line.trim_start().starts_with(BULLET_MARKERS)
}

/// Render the structure instructions embedded in the system prompt
pub fn format_instructions() -> String {
    let (min_sentences, max_sentences) = PARAGRAPH_SENTENCES;
    let (min_topics, max_topics) = REQUESTED_SUBTOPICS;
    format!(
        "Structure your response like this:\n\
         1. Start with a short paragraph ({min_sentences}–{max_sentences} sentences) answering the question.\n\
         2. Then list {min_topics} or {max_topics} short, clickable subtopics the user could explore next, \
         one per line, each starting with \"{marker} \".\n\
         Only use markdown formatting. No extra comments or instructions.\n",
        marker = PREFERRED_MARKER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_marker_is_recognised() {
        assert!(BULLET_MARKERS.contains(&PREFERRED_MARKER));
        assert!(is_bullet(&format!("{} Topic", PREFERRED_MARKER)));
    }

    #[test]
    fn bullet_detection_ignores_leading_whitespace() {
        assert!(is_bullet("   - indented"));
        assert!(is_bullet("\t• glyph"));
        assert!(!is_bullet("* star"));
        assert!(!is_bullet("plain"));
    }

    #[test]
    fn requested_range_fits_parser_limit() {
        assert!(REQUESTED_SUBTOPICS.0 <= REQUESTED_SUBTOPICS.1);
        assert!(REQUESTED_SUBTOPICS.1 <= MAX_SUBTOPICS);
    }
}
