//! Document analysis pipeline: scan, query, validate, and compute coverage.
//!
//! Each function mirrors one of `SpecLensServer`'s private `_scan_doc`/
//! `_query_spec`/`_get_algo_steps`/`_validate_doc`/`_coverage_doc` methods
//! from the original implementation, adapted to [`ServerState`]'s explicit
//! cache accessors instead of direct dict mutation.

use std::collections::HashSet;

use tracing::debug;

use crate::analysis::coverage::{compute_coverage, CoverageResult};
use crate::analysis::matcher::{classify_match, MatchResult};
use crate::analysis::scanner::{scan_document, scan_steps, UrlMatch};
use crate::analysis::scope::build_scopes;
use crate::analysis::steps::{find_step, parse_steps, AlgorithmStep};
use crate::analysis::StepValidation;
use crate::provider::SectionRecord;
use crate::server::{OwnedScope, ServerState};

/// Scan `text` for spec URL citations, using the per-document cache keyed by
/// `version` when possible.
pub fn scan_doc(state: &mut ServerState, uri: &str, text: &str, version: i32) -> Vec<UrlMatch> {
    state.ensure_url_pattern();
    if let Some(cached) = state.cached_doc_urls(uri, version) {
        return cached.clone();
    }
    let Some(pattern) = state.url_pattern().cloned() else {
        return Vec::new();
    };
    let lookup = state.base_url_lookup().clone();
    let matches = scan_document(text, &pattern, &lookup);
    state.cache_doc_urls(uri.to_string(), version, matches.clone());
    matches
}

/// Query the spec provider for `spec#anchor`, using the server-lifetime
/// query cache.
///
/// Per `SPEC_FULL.md` §7, provider failures are never surfaced to callers:
/// they are logged at `debug` and treated as no data found.
pub fn query_spec(state: &mut ServerState, spec: &str, anchor: &str) -> Option<SectionRecord> {
    let key = format!("{spec}#{anchor}");
    if let Some(cached) = state.cached_query(&key) {
        return Some(cached.clone());
    }
    match state.provider().query(&key) {
        Ok(record) => {
            state.cache_query(key, record.clone());
            Some(record)
        }
        Err(err) => {
            debug!(key = %key, error = %err, "spec query failed");
            None
        }
    }
}

/// Parse `content` into an algorithm step tree, using the server-lifetime
/// algorithm-step cache.
///
/// An empty parse (no numbered steps found) is never cached and always
/// reported as `None`, matching the original's falsy-empty-list handling.
pub fn get_algo_steps(
    state: &mut ServerState,
    anchor: &str,
    content: &str,
) -> Option<Vec<AlgorithmStep>> {
    if let Some(cached) = state.cached_algo_steps(anchor) {
        return Some(cached.clone());
    }
    let steps = parse_steps(content);
    if steps.is_empty() {
        return None;
    }
    state.cache_algo_steps(anchor.to_string(), steps.clone());
    Some(steps)
}

/// Validate every step comment in `text` against its cited algorithm,
/// caching scopes and validations by `version`.
pub fn validate_doc(
    state: &mut ServerState,
    uri: &str,
    text: &str,
    version: i32,
) -> Vec<StepValidation> {
    if let Some(cached) = state.cached_doc_validations(uri, version) {
        return cached.clone();
    }

    let url_matches = scan_doc(state, uri, text, version);
    let step_comments = scan_steps(text);
    if url_matches.is_empty() || step_comments.is_empty() {
        state.cache_doc_validations(uri.to_string(), version, Vec::new());
        state.cache_doc_scopes(uri.to_string(), version, Vec::new());
        return Vec::new();
    }

    let scopes: Vec<OwnedScope> = build_scopes(&url_matches, &step_comments)
        .into_iter()
        .map(|(url, steps)| (url, steps.into_iter().cloned().collect()))
        .collect();
    state.cache_doc_scopes(uri.to_string(), version, scopes.clone());

    let mut validations = Vec::new();
    for (url_match, steps_in_scope) in &scopes {
        if steps_in_scope.is_empty() {
            continue;
        }

        let Some(record) = query_spec(state, &url_match.spec, &url_match.anchor) else {
            continue;
        };
        if record.content.is_empty() {
            continue;
        }

        let Some(algo_steps) = get_algo_steps(state, &url_match.anchor, &record.content) else {
            continue;
        };

        for step_comment in steps_in_scope {
            match find_step(&algo_steps, &step_comment.number) {
                None => validations.push(StepValidation {
                    step: step_comment.clone(),
                    result: MatchResult::NotFound,
                    spec_text: String::new(),
                    algo_name: url_match.anchor.clone(),
                }),
                Some(spec_step) => {
                    let threshold = state.config().fuzzy_threshold;
                    let result = classify_match(&step_comment.text, &spec_step.text, threshold);
                    validations.push(StepValidation {
                        step: step_comment.clone(),
                        result,
                        spec_text: spec_step.text.clone(),
                        algo_name: url_match.anchor.clone(),
                    });
                }
            }
        }
    }

    state.cache_doc_validations(uri.to_string(), version, validations.clone());
    validations
}

/// Compute per-algorithm coverage for a document, reusing the scopes and
/// validations computed by [`validate_doc`].
pub fn coverage_doc(
    state: &mut ServerState,
    uri: &str,
    text: &str,
    version: i32,
) -> Vec<(UrlMatch, CoverageResult)> {
    if let Some(cached) = state.cached_doc_coverages(uri, version) {
        return cached.clone();
    }

    let validations = validate_doc(state, uri, text, version);
    if validations.is_empty() {
        state.cache_doc_coverages(uri.to_string(), version, Vec::new());
        return Vec::new();
    }

    let Some(scopes) = state.cached_doc_scopes(uri, version).cloned() else {
        state.cache_doc_coverages(uri.to_string(), version, Vec::new());
        return Vec::new();
    };

    let mut results = Vec::new();
    for (url_match, steps_in_scope) in &scopes {
        if steps_in_scope.is_empty() {
            continue;
        }
        let Some(algo_steps) = state.cached_algo_steps(&url_match.anchor).cloned() else {
            continue;
        };

        let scope_lines: HashSet<u32> = steps_in_scope.iter().map(|s| s.line).collect();
        let scope_vals: Vec<StepValidation> = validations
            .iter()
            .filter(|v| scope_lines.contains(&v.step.line))
            .cloned()
            .collect();

        let cov = compute_coverage(&scope_vals, &algo_steps, &url_match.anchor);
        results.push((url_match.clone(), cov));
    }

    state.cache_doc_coverages(uri.to_string(), version, results.clone());
    results
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::test_support::FixtureProvider;
    use std::sync::Arc;

    fn navigate_state() -> ServerState {
        let provider = FixtureProvider::new().with_section(
            "HTML",
            "navigate",
            Some("navigate".to_string()),
            Some("Algorithm".to_string()),
            "1. Let x be true\n2. Fetch the resource\n3. Process the response\n",
        );
        ServerState::new(ServerConfig::default(), Arc::new(provider))
    }

    const NAVIGATE_INPUT: &str = concat!(
        "// https://html.spec.whatwg.org/#navigate\n",
        "// Step 1. Let x be true\n",
        "// Step 2. Fetch the resource\n",
        "// Step 99. does not exist\n",
    );

    #[test]
    fn scan_doc_finds_the_cited_url() {
        let mut state = navigate_state();
        let matches = scan_doc(&mut state, "file:///t.cpp", NAVIGATE_INPUT, 1);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].spec, "HTML");
        assert_eq!(matches[0].anchor, "navigate");
    }

    #[test]
    fn scan_doc_caches_by_version() {
        let mut state = navigate_state();
        let first = scan_doc(&mut state, "file:///t.cpp", NAVIGATE_INPUT, 1);
        let second = scan_doc(&mut state, "file:///t.cpp", NAVIGATE_INPUT, 1);
        assert_eq!(first, second);
        let third = scan_doc(&mut state, "file:///t.cpp", NAVIGATE_INPUT, 2);
        assert_eq!(third.len(), first.len());
    }

    #[test]
    fn query_spec_returns_fixture_data_and_caches() {
        let mut state = navigate_state();
        scan_doc(&mut state, "file:///t.cpp", NAVIGATE_INPUT, 1);
        let first = query_spec(&mut state, "HTML", "navigate").unwrap();
        assert_eq!(first.title.as_deref(), Some("navigate"));
        let second = query_spec(&mut state, "HTML", "navigate").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn query_spec_unknown_anchor_returns_none() {
        let mut state = navigate_state();
        assert!(query_spec(&mut state, "HTML", "nonexistent").is_none());
    }

    #[test]
    fn validate_doc_reports_exact_mismatch_and_not_found() {
        let mut state = navigate_state();
        let validations = validate_doc(&mut state, "file:///t.cpp", NAVIGATE_INPUT, 1);
        assert_eq!(validations.len(), 3);

        let step_99 = validations
            .iter()
            .find(|v| v.step.number == vec![99])
            .unwrap();
        assert_eq!(step_99.result, MatchResult::NotFound);
    }

    #[test]
    fn validate_doc_caches_by_version() {
        let mut state = navigate_state();
        let v1 = validate_doc(&mut state, "file:///t.cpp", NAVIGATE_INPUT, 1);
        let v2 = validate_doc(&mut state, "file:///t.cpp", NAVIGATE_INPUT, 1);
        assert_eq!(v1, v2);
    }

    #[test]
    fn validate_doc_without_any_citation_is_empty() {
        let mut state = navigate_state();
        let text = "// Just a plain file with no spec URLs\nint main() {}\n";
        let validations = validate_doc(&mut state, "file:///plain.cpp", text, 1);
        assert!(validations.is_empty());
    }

    #[test]
    fn coverage_doc_reports_missing_and_implemented() {
        let mut state = navigate_state();
        let coverages = coverage_doc(&mut state, "file:///t.cpp", NAVIGATE_INPUT, 1);
        assert_eq!(coverages.len(), 1);
        let (url_match, cov) = &coverages[0];
        assert_eq!(url_match.anchor, "navigate");
        assert_eq!(cov.total_steps, 3);
        assert_eq!(cov.missing, vec![vec![3]]);
    }

    #[test]
    fn coverage_doc_with_no_steps_is_empty() {
        let mut state = navigate_state();
        let text = "// Just a plain file with no spec URLs\nint main() {}\n";
        let coverages = coverage_doc(&mut state, "file:///plain.cpp", text, 1);
        assert!(coverages.is_empty());
    }

    #[test]
    fn stricter_threshold_never_finds_fewer_mismatches() {
        let strict_provider = FixtureProvider::new().with_section(
            "HTML",
            "navigate",
            None,
            None,
            "1. Let x be true\n2. Fetch the resource\n3. Process the response\n",
        );
        let mut strict = ServerState::new(
            ServerConfig::default().with_fuzzy_threshold(0.99),
            Arc::new(strict_provider.clone()),
        );
        let mut lenient = ServerState::new(
            ServerConfig::default().with_fuzzy_threshold(0.5),
            Arc::new(strict_provider),
        );

        let strict_vals = validate_doc(&mut strict, "file:///t.cpp", NAVIGATE_INPUT, 1);
        let lenient_vals = validate_doc(&mut lenient, "file:///t.cpp", NAVIGATE_INPUT, 1);

        let strict_mismatches = strict_vals
            .iter()
            .filter(|v| v.result == MatchResult::Mismatch)
            .count();
        let lenient_mismatches = lenient_vals
            .iter()
            .filter(|v| v.result == MatchResult::Mismatch)
            .count();
        assert!(strict_mismatches >= lenient_mismatches);
    }
}
