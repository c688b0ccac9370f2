//! Classifying how well a step comment matches its canonical spec text.

use crate::analysis::normalize::{jaro_winkler, normalize_text};

/// How a step comment's text compares to the canonical algorithm step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchResult {
    /// Normalised texts are identical, or the comment carries no text.
    Exact,
    /// One is a prefix/substring of the other, or similarity clears the
    /// Jaro-Winkler threshold.
    Fuzzy,
    /// The cited step exists but the text diverges beyond the threshold.
    Mismatch,
    /// No step with this number exists in the cited algorithm.
    NotFound,
}

/// Classify how well `comment_text` matches `spec_text`.
///
/// `threshold` is the Jaro-Winkler similarity cutoff for a FUZZY
/// classification, typically [`crate::config::ServerConfig::fuzzy_threshold`].
///
/// A step comment with no text after its number (e.g. bare `// 5.`) always
/// counts as EXACT — an author citing the step number without repeating its
/// wording isn't claiming anything that could mismatch.
#[must_use]
pub fn classify_match(comment_text: &str, spec_text: &str, threshold: f64) -> MatchResult {
    if comment_text.trim().is_empty() {
        return MatchResult::Exact;
    }

    let norm_comment = normalize_text(comment_text);
    let norm_spec = normalize_text(spec_text);

    if norm_comment.is_empty() || norm_spec.is_empty() {
        return if norm_comment.is_empty() {
            MatchResult::Exact
        } else {
            MatchResult::Mismatch
        };
    }

    if norm_comment == norm_spec {
        return MatchResult::Exact;
    }

    if norm_spec.starts_with(&norm_comment) || norm_comment.starts_with(&norm_spec) {
        return MatchResult::Fuzzy;
    }

    if norm_spec.contains(&norm_comment) || norm_comment.contains(&norm_spec) {
        return MatchResult::Fuzzy;
    }

    if jaro_winkler(&norm_comment, &norm_spec) >= threshold {
        return MatchResult::Fuzzy;
    }

    MatchResult::Mismatch
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const DEFAULT_THRESHOLD: f64 = 0.85;

    #[test]
    fn empty_comment_text_is_exact() {
        assert_eq!(
            classify_match("", "Let x be true.", DEFAULT_THRESHOLD),
            MatchResult::Exact
        );
        assert_eq!(
            classify_match("   ", "Let x be true.", DEFAULT_THRESHOLD),
            MatchResult::Exact
        );
    }

    #[test]
    fn identical_normalised_text_is_exact() {
        assert_eq!(
            classify_match("Let x be true.", "Let x be **true**", DEFAULT_THRESHOLD),
            MatchResult::Exact
        );
    }

    #[rstest]
    #[case("Let x be true", "Let x be true if the flag is set")]
    #[case("Let x be true if the flag is set", "Let x be true")]
    fn prefix_match_is_fuzzy(#[case] comment: &str, #[case] spec: &str) {
        assert_eq!(
            classify_match(comment, spec, DEFAULT_THRESHOLD),
            MatchResult::Fuzzy
        );
    }

    #[test]
    fn substring_match_is_fuzzy() {
        assert_eq!(
            classify_match("be true", "let x be true always", DEFAULT_THRESHOLD),
            MatchResult::Fuzzy
        );
    }

    #[test]
    fn similar_but_not_substring_text_is_fuzzy_above_threshold() {
        assert_eq!(
            classify_match("Let x be true", "Let y be true", DEFAULT_THRESHOLD),
            MatchResult::Fuzzy
        );
    }

    #[test]
    fn dissimilar_text_is_mismatch() {
        assert_eq!(
            classify_match("Let x be true", "Fetch the resource", DEFAULT_THRESHOLD),
            MatchResult::Mismatch
        );
    }

    #[test]
    fn empty_spec_text_with_nonempty_comment_is_mismatch() {
        assert_eq!(
            classify_match("Something specific", "", DEFAULT_THRESHOLD),
            MatchResult::Mismatch
        );
    }

    #[test]
    fn threshold_is_configurable() {
        let comment = "Let x be true";
        let spec = "Let y be true";
        assert_eq!(classify_match(comment, spec, 0.99), MatchResult::Mismatch);
        assert_eq!(classify_match(comment, spec, 0.5), MatchResult::Fuzzy);
    }
}
