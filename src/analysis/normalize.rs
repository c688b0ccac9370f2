//! Text normalisation and similarity scoring for step-comment matching.

use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::steps::strip_markdown;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap_or_else(|e| unreachable_regex(e)));
static TRAILING_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,:;!?]+$").unwrap_or_else(|e| unreachable_regex(e)));

#[cold]
fn unreachable_regex(e: regex::Error) -> Regex {
    unreachable!("static pattern failed to compile: {e}")
}

/// Normalise text for comparison: strip markdown, collapse whitespace,
/// lowercase, and strip trailing punctuation.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let stripped = strip_markdown(text);
    let collapsed = WHITESPACE_RE.replace_all(&stripped, " ");
    let trimmed = collapsed.trim().to_lowercase();
    TRAILING_PUNCT_RE.replace(&trimmed, "").into_owned()
}

/// Jaro-Winkler similarity between two strings, in `[0.0, 1.0]`.
///
/// Delegates to [`strsim::jaro_winkler`], which implements the same
/// algorithm (matching window, transposition count, and a prefix boost
/// capped at 4 characters) as the reference implementation this crate's
/// matcher is grounded on.
#[must_use]
pub fn jaro_winkler(s1: &str, s2: &str) -> f64 {
    strsim::jaro_winkler(s1, s2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Let  x be **true**.", "let x be true")]
    #[case("The `value` is set", "the value is set")]
    #[case("[Link text](http://example.com)", "link text")]
    #[case("Trailing punctuation!!!", "trailing punctuation")]
    fn normalize_text_handles_markdown_and_whitespace(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_text(input), expected);
    }

    #[test]
    fn normalize_text_empty_string_stays_empty() {
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn jaro_winkler_identical_strings_is_one() {
        assert!((jaro_winkler("let x be true", "let x be true") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jaro_winkler_empty_strings_is_zero() {
        assert!((jaro_winkler("", "something")).abs() < f64::EPSILON);
    }

    #[test]
    fn jaro_winkler_similar_strings_score_high() {
        let score = jaro_winkler("let x be true", "let y be true");
        assert!(score > 0.85, "expected high similarity, got {score}");
    }
}
