//! Associating step comments with their nearest preceding spec URL citation.

use crate::analysis::scanner::{Scope, StepComment, UrlMatch};

/// Associate step comments with their nearest preceding spec URL.
///
/// A spec URL opens a scope that extends until the next spec URL or end of
/// file. Step comments that appear before the first URL citation are
/// dropped: there is no algorithm for them to belong to.
#[must_use]
pub fn build_scopes<'a>(
    url_matches: &[UrlMatch],
    step_comments: &'a [StepComment],
) -> Vec<Scope<'a>> {
    if url_matches.is_empty() {
        return Vec::new();
    }

    let mut sorted_urls: Vec<&UrlMatch> = url_matches.iter().collect();
    sorted_urls.sort_by_key(|u| u.line);
    let mut sorted_steps: Vec<&StepComment> = step_comments.iter().collect();
    sorted_steps.sort_by_key(|s| s.line);

    let mut scopes: Vec<Scope<'a>> = sorted_urls.iter().map(|u| ((*u).clone(), Vec::new())).collect();

    for step in sorted_steps {
        let mut best_scope = None;
        for (i, (url, _)) in scopes.iter().enumerate() {
            if url.line <= step.line {
                best_scope = Some(i);
            } else {
                break;
            }
        }
        if let Some(idx) = best_scope {
            if let Some(entry) = scopes.get_mut(idx) {
                entry.1.push(step);
            }
        }
    }

    scopes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(line: u32, anchor: &str) -> UrlMatch {
        UrlMatch {
            line,
            col_start: 0,
            col_end: 10,
            spec: "HTML".to_string(),
            anchor: anchor.to_string(),
            url: format!("https://example#{anchor}"),
        }
    }

    fn step(line: u32, number: Vec<u32>) -> StepComment {
        StepComment {
            line,
            col_start: 0,
            col_end: 10,
            number,
            text: String::new(),
            end_line: None,
        }
    }

    #[test]
    fn steps_before_first_url_are_dropped() {
        let steps = vec![step(0, vec![1])];
        let urls = vec![url(5, "navigate")];
        let scopes = build_scopes(&urls, &steps);
        assert_eq!(scopes.len(), 1);
        assert!(scopes[0].1.is_empty());
    }

    #[test]
    fn steps_assigned_to_nearest_preceding_url() {
        let urls = vec![url(0, "fetch"), url(10, "navigate")];
        let steps = vec![step(2, vec![1]), step(12, vec![1])];
        let scopes = build_scopes(&urls, &steps);
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0].1.len(), 1);
        assert_eq!(scopes[0].1[0].line, 2);
        assert_eq!(scopes[1].1.len(), 1);
        assert_eq!(scopes[1].1[0].line, 12);
    }

    #[test]
    fn empty_url_matches_yields_no_scopes() {
        let steps = vec![step(0, vec![1])];
        let scopes = build_scopes(&[], &steps);
        assert!(scopes.is_empty());
    }
}
