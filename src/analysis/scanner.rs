//! Scanning source text for spec URL citations and numbered step comments.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::provider::SpecRef;

/// A spec URL citation found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatch {
    /// 0-based line number.
    pub line: u32,
    /// Byte column where the match starts.
    pub col_start: u32,
    /// Byte column where the match ends.
    pub col_end: u32,
    /// Spec identifier, e.g. `"HTML"`.
    pub spec: String,
    /// Section anchor, e.g. `"navigate"`.
    pub anchor: String,
    /// The full matched URL text.
    pub url: String,
}

/// A numbered step comment found in source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepComment {
    /// 0-based line number where the step comment starts.
    pub line: u32,
    /// Byte column where the match starts.
    pub col_start: u32,
    /// Byte column where the match (or its last continuation line) ends.
    pub col_end: u32,
    /// Hierarchical step number, e.g. `[5, 1]` for "Step 5.1".
    pub number: Vec<u32>,
    /// Text following the step number, continuation lines merged in.
    pub text: String,
    /// Last line of a multi-line comment; `None` when the comment is a
    /// single line.
    pub end_line: Option<u32>,
}

// Matches step comments in various comment styles:
// // Step 5.1. text    // 5.1. text    # Step 5. text    /* Step 5 text */
//
// To avoid false positives on bare numbers (e.g. "// 42 is the answer"), at
// least one of the following must hold: an explicit "Step" prefix, a
// multi-part number like 5.1, or a trailing dot after the number.
static STEP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?://|#|;+|/\*+|\*)\s*([Ss]tep\s+)?(\d{1,3}(?:\.\d{1,3})*)(\.)?\s*(.*?)\s*(?:\*/)?$",
    )
    .unwrap_or_else(|e| unreachable_regex(e))
});

static CONTINUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?://|#|;+|\*)\s*(.*?)\s*(?:\*/)?$").unwrap_or_else(|e| unreachable_regex(e))
});

#[cold]
fn unreachable_regex(e: regex::Error) -> Regex {
    unreachable!("static pattern failed to compile: {e}")
}

/// Build a regex matching any of the registered specs' URLs.
///
/// Matches both single-page URLs (`base/#anchor`) and multipage URLs
/// (`base/multipage/page.html#anchor`): an optional path segment is allowed
/// between the base URL and the `#anchor`.
///
/// Bases are sorted longest-first before alternation: regex alternation
/// takes the first matching branch, so if one base were a prefix of another
/// (e.g. `https://spec.example` and `https://spec.example/v2`) a shorter
/// base listed first would shadow the longer, more specific one.
#[must_use]
pub fn build_url_pattern(spec_urls: &[SpecRef]) -> Regex {
    let mut bases: Vec<String> = spec_urls.iter().map(|s| regex::escape(&s.base_url)).collect();
    bases.sort_by_key(|b| std::cmp::Reverse(b.len()));
    let pattern = format!(
        r"({})/(?:[^\s#]*)?#([\w:._%{{}}()-]+)",
        bases.join("|")
    );
    Regex::new(&pattern).unwrap_or_else(|e| unreachable!("built URL pattern failed to compile: {e}"))
}

/// Build a `base_url -> spec name` lookup.
#[must_use]
pub fn build_spec_lookup(spec_urls: &[SpecRef]) -> HashMap<String, String> {
    spec_urls
        .iter()
        .map(|s| (s.base_url.clone(), s.spec.clone()))
        .collect()
}

/// Scan document text for spec URL citations.
///
/// Returns matches in source order (line, then column within the line).
#[must_use]
pub fn scan_document(
    text: &str,
    pattern: &Regex,
    spec_lookup: &HashMap<String, String>,
) -> Vec<UrlMatch> {
    let mut matches = Vec::new();
    for (line_num, line) in text.lines().enumerate() {
        for m in pattern.captures_iter(line) {
            let Some(whole) = m.get(0) else { continue };
            let Some(base_url) = m.get(1) else { continue };
            let Some(anchor) = m.get(2) else { continue };
            let spec = spec_lookup.get(base_url.as_str()).cloned().unwrap_or_default();
            matches.push(UrlMatch {
                line: u32::try_from(line_num).unwrap_or(u32::MAX),
                col_start: u32::try_from(whole.start()).unwrap_or(u32::MAX),
                col_end: u32::try_from(whole.end()).unwrap_or(u32::MAX),
                spec,
                anchor: anchor.as_str().to_string(),
                url: whole.as_str().to_string(),
            });
        }
    }
    matches
}

/// Scan document text for numbered step comments.
///
/// Continuation lines — further comment lines that carry no step number,
/// immediately following a step comment — are merged into its text.
#[must_use]
pub fn scan_steps(text: &str) -> Vec<StepComment> {
    let lines: Vec<&str> = text.lines().collect();
    let mut results = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(m) = STEP_PATTERN.captures(lines[i]) else {
            i += 1;
            continue;
        };

        let has_step_prefix = m.get(1).is_some();
        let Some(number_match) = m.get(2) else {
            i += 1;
            continue;
        };
        let number_str = number_match.as_str();
        let has_trailing_dot = m.get(3).is_some();
        let step_text = m.get(4).map(|g| g.as_str()).unwrap_or_default().to_string();
        let is_multi_part = number_str.contains('.');

        if !(has_step_prefix || has_trailing_dot || is_multi_part) {
            i += 1;
            continue;
        }

        let Some(whole) = m.get(0) else {
            i += 1;
            continue;
        };
        let col_start = whole.start();
        let mut col_end = whole.end();
        let mut text_acc = step_text;

        let mut j = i + 1;
        while j < lines.len() {
            if STEP_PATTERN.is_match(lines[j]) {
                break;
            }
            let Some(cont) = CONTINUATION_RE.captures(lines[j]) else {
                break;
            };
            let cont_text = cont.get(1).map(|g| g.as_str()).unwrap_or_default();
            if cont_text.is_empty() {
                break;
            }
            text_acc.push(' ');
            text_acc.push_str(cont_text);
            let Some(cont_whole) = cont.get(0) else { break };
            col_end = cont_whole.end();
            j += 1;
        }

        let end_line = if j > i + 1 {
            Some(u32::try_from(j - 1).unwrap_or(u32::MAX))
        } else {
            None
        };
        let number: Vec<u32> = number_str
            .split('.')
            .filter_map(|p| p.parse().ok())
            .collect();

        results.push(StepComment {
            line: u32::try_from(i).unwrap_or(u32::MAX),
            col_start: u32::try_from(col_start).unwrap_or(u32::MAX),
            col_end: u32::try_from(col_end).unwrap_or(u32::MAX),
            number,
            text: text_acc,
            end_line,
        });
        i = j;
    }

    results
}

/// Find a URL match covering the given cursor position, if any.
#[must_use]
pub fn find_url_at_position(matches: &[UrlMatch], line: u32, col: u32) -> Option<&UrlMatch> {
    matches
        .iter()
        .find(|m| m.line == line && m.col_start <= col && col <= m.col_end)
}

/// A spec URL's scope: the URL citation plus every step comment assigned to
/// it.
pub type Scope<'a> = (UrlMatch, Vec<&'a StepComment>);

#[cfg(test)]
mod tests {
    use super::*;

    fn html_spec_urls() -> Vec<SpecRef> {
        vec![SpecRef {
            spec: "HTML".to_string(),
            base_url: "https://html.spec.whatwg.org".to_string(),
        }]
    }

    #[test]
    fn scan_document_finds_single_page_url() {
        let urls = html_spec_urls();
        let pattern = build_url_pattern(&urls);
        let lookup = build_spec_lookup(&urls);
        let text = "// https://html.spec.whatwg.org/#navigate\n";
        let matches = scan_document(text, &pattern, &lookup);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].spec, "HTML");
        assert_eq!(matches[0].anchor, "navigate");
    }

    #[test]
    fn build_url_pattern_prefers_longer_base_when_one_prefixes_another() {
        let urls = vec![
            SpecRef {
                spec: "SHORT".to_string(),
                base_url: "https://spec.example".to_string(),
            },
            SpecRef {
                spec: "LONG".to_string(),
                base_url: "https://spec.example/v2".to_string(),
            },
        ];
        let pattern = build_url_pattern(&urls);
        let lookup = build_spec_lookup(&urls);
        let text = "// https://spec.example/v2/#navigate\n";
        let matches = scan_document(text, &pattern, &lookup);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].spec, "LONG");
    }

    #[test]
    fn scan_document_finds_multipage_url() {
        let urls = html_spec_urls();
        let pattern = build_url_pattern(&urls);
        let lookup = build_spec_lookup(&urls);
        let text = "// https://html.spec.whatwg.org/multipage/browsing-the-web.html#navigate\n";
        let matches = scan_document(text, &pattern, &lookup);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].anchor, "navigate");
    }

    #[test]
    fn scan_steps_requires_step_signal() {
        let text = "// 42 is the answer\n";
        let steps = scan_steps(text);
        assert!(steps.is_empty(), "bare number must not be treated as a step");
    }

    #[test]
    fn scan_steps_matches_step_prefix() {
        let text = "// Step 5 let x be true\n";
        let steps = scan_steps(text);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].number, vec![5]);
        assert_eq!(steps[0].text, "let x be true");
    }

    #[test]
    fn scan_steps_matches_trailing_dot() {
        let text = "// 5. let x be true\n";
        let steps = scan_steps(text);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].number, vec![5]);
    }

    #[test]
    fn scan_steps_matches_multi_part_number() {
        let text = "// 5.1 let x be true\n";
        let steps = scan_steps(text);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].number, vec![5, 1]);
    }

    #[test]
    fn scan_steps_matches_block_comment_style() {
        let text = "/* Step 5. let x be true */\n";
        let steps = scan_steps(text);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].number, vec![5]);
        assert_eq!(steps[0].text, "let x be true");
    }

    #[test]
    fn scan_steps_matches_repeated_semicolon_style() {
        let text = ";; Step 5. let x be true\n";
        let steps = scan_steps(text);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].number, vec![5]);
        assert_eq!(steps[0].text, "let x be true");
    }

    #[test]
    fn scan_document_finds_url_inside_block_comment() {
        let urls = html_spec_urls();
        let pattern = build_url_pattern(&urls);
        let lookup = build_spec_lookup(&urls);
        let text = "/* https://html.spec.whatwg.org/#navigate */\n";
        let matches = scan_document(text, &pattern, &lookup);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].anchor, "navigate");
    }

    #[test]
    fn scan_steps_merges_continuation_lines() {
        let text = "// Step 5. let x be true\n// if the flag is set\n";
        let steps = scan_steps(text);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].text, "let x be true if the flag is set");
        assert_eq!(steps[0].end_line, Some(1));
    }

    #[test]
    fn scan_steps_stops_continuation_at_next_step() {
        let text = "// Step 5. first\n// Step 6. second\n";
        let steps = scan_steps(text);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].text, "first");
        assert_eq!(steps[1].text, "second");
    }

    #[test]
    fn find_url_at_position_matches_within_span() {
        let matches = vec![UrlMatch {
            line: 0,
            col_start: 3,
            col_end: 20,
            spec: "HTML".to_string(),
            anchor: "navigate".to_string(),
            url: "https://example#navigate".to_string(),
        }];
        assert!(find_url_at_position(&matches, 0, 10).is_some());
        assert!(find_url_at_position(&matches, 0, 21).is_none());
        assert!(find_url_at_position(&matches, 1, 10).is_none());
    }
}
