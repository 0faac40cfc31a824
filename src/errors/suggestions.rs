//! "Did you mean?" suggestions for audience parameters
//!
//! Uses Jaro-Winkler similarity to recover from typos in education
//! levels and tones typed on the command line.

use strsim::jaro_winkler;

/// Default similarity threshold for suggestions (0.0 to 1.0)
const DEFAULT_THRESHOLD: f64 = 0.6;

const EDUCATION_LEVELS: [&str; 4] = ["Primary", "Secondary", "University", "PhD"];
const TONES: [&str; 2] = ["Informative", "Technical"];

/// Find the most similar string from a list of candidates
///
/// Comparison is case-insensitive. Returns the best match if it exceeds
/// the threshold.
pub fn find_similar<'a>(input: &str, candidates: &[&'a str], threshold: f64) -> Option<&'a str> {
    let input = input.to_lowercase();
    candidates
        .iter()
        .map(|c| (jaro_winkler(&input, &c.to_lowercase()), *c))
        .filter(|(score, _)| *score > threshold)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, name)| name)
}

fn suggest(unknown: &str, kind: &str, candidates: &[&str]) -> String {
    if let Some(suggestion) = find_similar(unknown, candidates, DEFAULT_THRESHOLD) {
        format!(
            "Did you mean '{}'?\n\nAvailable {}: {}",
            suggestion,
            kind,
            candidates.join(", ")
        )
    } else {
        format!(
            "Unknown {} '{}'.\n\nAvailable {}: {}",
            kind.trim_end_matches('s'),
            unknown,
            kind,
            candidates.join(", ")
        )
    }
}

/// Generate a suggestion for an unknown education level
pub fn suggest_education(unknown: &str) -> String {
    suggest(unknown, "education levels", &EDUCATION_LEVELS)
}

/// Generate a suggestion for an unknown tone
pub fn suggest_tone(unknown: &str) -> String {
    suggest(unknown, "tones", &TONES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_similar_is_case_insensitive() {
        assert_eq!(find_similar("phd", &EDUCATION_LEVELS, 0.6), Some("PhD"));
    }

    #[test]
    fn find_similar_typo() {
        assert_eq!(
            find_similar("secondry", &EDUCATION_LEVELS, 0.6),
            Some("Secondary")
        );
    }

    #[test]
    fn find_similar_no_match() {
        assert_eq!(find_similar("xyz", &TONES, 0.6), None);
    }

    #[test]
    fn suggest_tone_typo() {
        let suggestion = suggest_tone("technicl");
        assert!(suggestion.contains("Did you mean 'Technical'"));
    }

    #[test]
    fn suggest_education_lists_levels_when_unknown() {
        let suggestion = suggest_education("qqqq");
        assert!(suggestion.contains("Unknown education level"));
        assert!(suggestion.contains("Primary, Secondary, University, PhD"));
    }
}
