//! Diagnostic computation and publishing for step validation warnings.
//!
//! A step comment whose validation result is EXACT or FUZZY produces no
//! diagnostic. MISMATCH and NOT_FOUND each produce a warning carrying the
//! expected spec text as related information, mirroring the original
//! server's `_publish_diagnostics` closure.

use async_lsp::lsp_types::notification;
use lsp_types::{
    Diagnostic, DiagnosticRelatedInformation, DiagnosticSeverity, Location,
    PublishDiagnosticsParams, Url,
};
use tracing::warn;

use crate::analysis::matcher::MatchResult;
use crate::analysis::StepValidation;
use crate::handlers::util::span_to_lsp_range;
use crate::server::ServerState;

/// Diagnostic source identifier for this server's diagnostics.
const DIAGNOSTIC_SOURCE: &str = "webspec-lsp";

/// Build the diagnostics for `validations` against `source` text, addressed
/// to `uri` (carried on each diagnostic's related-information location).
#[must_use]
pub fn compute_diagnostics(validations: &[StepValidation], source: &str, uri: &Url) -> Vec<Diagnostic> {
    validations
        .iter()
        .filter(|v| matches!(v.result, MatchResult::Mismatch | MatchResult::NotFound))
        .map(|v| build_diagnostic(v, source, uri))
        .collect()
}

fn build_diagnostic(validation: &StepValidation, source: &str, uri: &Url) -> Diagnostic {
    let step = &validation.step;
    let label = crate::handlers::util::step_label(&step.number);
    let message = match validation.result {
        MatchResult::NotFound => {
            format!(
                "Step {label}: not found in algorithm '{}'",
                validation.algo_name
            )
        }
        _ => format!("Step {label}: text differs from spec"),
    };

    let end_line = step.end_line.unwrap_or(step.line);
    let range = span_to_lsp_range(source, step.line, step.col_start, end_line, step.col_end);

    let related_information = (!validation.spec_text.is_empty()).then(|| {
        vec![DiagnosticRelatedInformation {
            location: Location {
                uri: uri.clone(),
                range,
            },
            message: format!("Expected: {}", validation.spec_text),
        }]
    });

    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::WARNING),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message,
        related_information,
        ..Default::default()
    }
}

/// Publish `diagnostics` for `uri` via the client socket, if one is
/// registered. A no-op (logged at `debug`) when running without a live
/// client, e.g. in tests.
pub fn publish_diagnostics(state: &ServerState, uri: &Url, diagnostics: Vec<Diagnostic>) {
    let Some(client) = state.client() else {
        tracing::debug!("no client socket available for publishing diagnostics");
        return;
    };

    let params = PublishDiagnosticsParams::new(uri.clone(), diagnostics, None);
    if let Err(err) = client.notify::<notification::PublishDiagnostics>(params) {
        warn!(error = %err, "failed to publish diagnostics");
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use crate::analysis::scanner::StepComment;

    fn test_uri() -> Url {
        Url::parse("file:///t.cpp").unwrap()
    }

    fn step(number: Vec<u32>, line: u32, end_line: Option<u32>) -> StepComment {
        StepComment {
            line,
            col_start: 3,
            col_end: 20,
            number,
            text: String::new(),
            end_line,
        }
    }

    fn validation(result: MatchResult, spec_text: &str) -> StepValidation {
        StepValidation {
            step: step(vec![5], 0, None),
            result,
            spec_text: spec_text.to_string(),
            algo_name: "navigate".to_string(),
        }
    }

    #[test]
    fn exact_and_fuzzy_produce_no_diagnostics() {
        let validations = vec![
            validation(MatchResult::Exact, ""),
            validation(MatchResult::Fuzzy, "spec text"),
        ];
        let diags = compute_diagnostics(&validations, "line one\n", &test_uri());
        assert!(diags.is_empty());
    }

    #[test]
    fn not_found_produces_warning_naming_the_algorithm() {
        let validations = vec![validation(MatchResult::NotFound, "")];
        let diags = compute_diagnostics(&validations, "// Step 5. text\n", &test_uri());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::WARNING));
        assert!(diags[0].message.contains("not found in algorithm 'navigate'"));
        assert!(diags[0].related_information.is_none());
    }

    #[test]
    fn mismatch_carries_expected_spec_text_as_related_information() {
        let validations = vec![validation(MatchResult::Mismatch, "Let y be false")];
        let diags = compute_diagnostics(&validations, "// Step 5. text\n", &test_uri());
        assert_eq!(diags.len(), 1);
        let related = diags[0].related_information.as_ref().expect("related info");
        assert_eq!(related.len(), 1);
        assert!(related[0].message.contains("Let y be false"));
    }

    #[test]
    fn diagnostic_range_spans_multiline_step_comments() {
        let mut v = validation(MatchResult::Mismatch, "spec");
        v.step = step(vec![5], 0, Some(1));
        let source = "// Step 5. first\n// continues\n";
        let diags = compute_diagnostics(&[v], source, &test_uri());
        assert_eq!(diags[0].range.start.line, 0);
        assert_eq!(diags[0].range.end.line, 1);
    }
}
