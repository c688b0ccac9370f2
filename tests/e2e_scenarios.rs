//! Behavioural tests covering the end-to-end scenarios in `spec.md` §8.
//!
//! These drive the public analyzer and handler entry points the same way the
//! LSP router does, without a full stdio transport — mirroring the teacher's
//! own `tests/diagnostics*.rs`, which exercise diagnostic computation without
//! a live client socket.

#![expect(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "integration tests use expect for clear failure messages"
)]

use std::sync::Arc;

use lsp_types::{CodeLensParams, TextDocumentIdentifier, Url};
use rstest::rstest;

use webspec_lsp::analysis::matcher::MatchResult;
use webspec_lsp::analysis::scanner::scan_steps;
use webspec_lsp::analyzer::{coverage_doc, validate_doc};
use webspec_lsp::config::ServerConfig;
use webspec_lsp::handlers::handle_code_lens;
use webspec_lsp::server::ServerState;
use webspec_lsp::test_support::FixtureProvider;

fn navigate_state(content: &str) -> ServerState {
    let provider = FixtureProvider::new().with_section(
        "HTML",
        "navigate",
        Some("navigate".to_string()),
        Some("algorithm".to_string()),
        content,
    );
    ServerState::new(ServerConfig::default(), Arc::new(provider))
}

fn two_anchor_state() -> ServerState {
    let provider = FixtureProvider::new()
        .with_section(
            "HTML",
            "anchor-a",
            None,
            None,
            "1. First step\n2. Second step\n",
        )
        .with_section(
            "HTML",
            "anchor-b",
            None,
            None,
            "1. First step\n2. Second step\n",
        );
    ServerState::new(ServerConfig::default(), Arc::new(provider))
}

/// Scenario (a): markdown formatting and trailing punctuation in the spec
/// text normalise away, so a step comment with none of that decoration is
/// still EXACT.
#[test]
fn scenario_a_markdown_and_punctuation_normalise_to_exact() {
    let mut state = navigate_state(concat!(
        "1. First\n",
        "2. Second\n",
        "3. Third\n",
        "4. Fourth\n",
        "5. Assert: *userInvolvement* is \"browser UI\".\n",
    ));
    let text = concat!(
        "// https://html.spec.whatwg.org/#navigate\n",
        "// Step 5. Assert: userInvolvement is browser UI\n",
    );
    let validations = validate_doc(&mut state, "file:///t.cpp", text, 1);
    assert_eq!(validations.len(), 1);
    assert_eq!(validations[0].result, MatchResult::Exact);
}

/// Scenario (b): a bare number with no `Step` prefix, no trailing dot, and a
/// single part is not a step comment at all.
#[test]
fn scenario_b_bare_number_is_not_a_step_comment() {
    let steps = scan_steps("// 42 is the answer\n");
    assert!(steps.is_empty());
}

/// Scenario (c): a trailing-dot single-part number is a valid step comment.
#[test]
fn scenario_c_trailing_dot_number_is_a_step_comment() {
    let steps = scan_steps("// 5. Let x be y\n");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].number, vec![5]);
    assert_eq!(steps[0].text, "Let x be y");
}

/// Scenario (d): four flat steps implemented out of order, all EXACT,
/// produce `reordered = 1` via the strict LIS computation.
#[test]
fn scenario_d_out_of_order_implementation_is_reordered_by_one() {
    let mut state = navigate_state(
        "1. First\n2. Second\n3. Third\n4. Fourth\n",
    );
    let text = concat!(
        "// https://html.spec.whatwg.org/#navigate\n",
        "// Step 3. Third\n",
        "// Step 1. First\n",
        "// Step 2. Second\n",
        "// Step 4. Fourth\n",
    );
    let coverages = coverage_doc(&mut state, "file:///t.cpp", text, 1);
    assert_eq!(coverages.len(), 1);
    let (_, cov) = &coverages[0];
    assert_eq!(cov.total_steps, 4);
    assert_eq!(cov.implemented_count(), 4);
    assert_eq!(cov.warnings, 0);
    assert_eq!(cov.reordered, 1);
}

/// Scenario (e): a step comment belongs to the nearest *preceding* URL
/// citation, not the first one in the file.
#[test]
fn scenario_e_step_after_second_url_belongs_to_second_scope() {
    let mut state = two_anchor_state();
    let text = concat!(
        "// https://html.spec.whatwg.org/#anchor-a\n",
        "// Step 1. First step\n",
        "// https://html.spec.whatwg.org/#anchor-b\n",
        "// Step 1. First step\n",
        "// Step 2. Second step\n",
    );
    let coverages = coverage_doc(&mut state, "file:///t.cpp", text, 1);
    assert_eq!(coverages.len(), 2);

    let anchor_a = coverages
        .iter()
        .find(|(u, _)| u.anchor == "anchor-a")
        .expect("anchor-a coverage");
    let anchor_b = coverages
        .iter()
        .find(|(u, _)| u.anchor == "anchor-b")
        .expect("anchor-b coverage");

    assert_eq!(anchor_a.1.implemented_count(), 1);
    assert_eq!(anchor_b.1.implemented_count(), 2);
}

/// Scenario (f): a step number absent from the cited algorithm is NOT_FOUND
/// and surfaces as a single warning-severity diagnostic.
#[test]
fn scenario_f_unknown_step_number_is_not_found_and_warns() {
    let mut state = navigate_state("1. Only step\n");
    let text = concat!(
        "// https://html.spec.whatwg.org/#navigate\n",
        "// Step 99. Bogus\n",
    );
    let validations = validate_doc(&mut state, "file:///t.cpp", text, 1);
    assert_eq!(validations.len(), 1);
    assert_eq!(validations[0].result, MatchResult::NotFound);

    let diagnostics =
        webspec_lsp::handlers::diagnostics::compute_diagnostics(&validations, text, &test_uri());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].severity,
        Some(lsp_types::DiagnosticSeverity::WARNING)
    );
}

fn test_uri() -> Url {
    Url::parse("file:///t.cpp").expect("valid test URI")
}

/// Coverage lens reports the right denominator and missing labels across a
/// handful of realistic step counts.
#[rstest]
#[case(2, vec![1], 1)]
#[case(3, vec![1, 2], 1)]
#[case(5, vec![1, 2, 3, 5], 1)]
fn code_lens_reports_expected_missing_count(
    #[case] total: usize,
    #[case] implemented: Vec<u32>,
    #[case] expected_missing: usize,
) {
    let content: String = (1..=total).map(|i| format!("{i}. Step {i}\n")).collect();
    let mut state = navigate_state(&content);

    let mut text = String::from("// https://html.spec.whatwg.org/#navigate\n");
    for n in &implemented {
        text.push_str(&format!("// Step {n}. Step {n}\n"));
    }

    let uri = test_uri();
    state.open_document(uri.to_string(), 1, text);

    let lenses = handle_code_lens(
        &mut state,
        CodeLensParams {
            text_document: TextDocumentIdentifier { uri },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        },
    )
    .expect("lenses");
    assert_eq!(lenses.len(), 1);
    let command = lenses[0].command.as_ref().expect("command");
    let args = command.arguments.as_ref().expect("arguments");
    let missing_labels = args[2].as_array().expect("missing labels array");
    assert_eq!(missing_labels.len(), expected_missing);
}
