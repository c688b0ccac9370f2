//! `textDocument/codeLens`: per-algorithm coverage summaries.

use lsp_types::{CodeLens, CodeLensParams, Command, Position, Range};
use serde_json::json;

use crate::analyzer::coverage_doc;
use crate::handlers::util::step_label;
use crate::server::ServerState;

/// Handle `textDocument/codeLens`.
///
/// Returns one lens per cited algorithm, anchored to the citation's line,
/// carrying a `webspecLens.showCoverage` command whose arguments are the
/// algorithm's anchor, its total step count, and the labels of its missing
/// steps — mirroring the original server's `code_lens` handler.
#[must_use]
pub fn handle_code_lens(state: &mut ServerState, params: CodeLensParams) -> Option<Vec<CodeLens>> {
    let uri = params.text_document.uri;
    let (version, text) = state.document(uri.as_str())?;
    let text = text.to_string();

    let coverages = coverage_doc(state, uri.as_str(), &text, version);
    if coverages.is_empty() {
        return None;
    }

    let lenses: Vec<CodeLens> = coverages
        .into_iter()
        .map(|(url_match, cov)| {
            let missing_labels: Vec<String> = cov.missing.iter().map(|n| step_label(n)).collect();
            let position = Position::new(url_match.line, 0);
            CodeLens {
                range: Range::new(position, position),
                command: Some(Command {
                    title: cov.summary(),
                    command: "webspecLens.showCoverage".to_string(),
                    arguments: Some(vec![
                        json!(cov.anchor),
                        json!(cov.total_steps),
                        json!(missing_labels),
                    ]),
                }),
                data: None,
            }
        })
        .collect();

    Some(lenses)
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
    use lsp_types::{TextDocumentIdentifier, Url};
    use std::sync::Arc;

    fn test_state() -> ServerState {
        let provider = FixtureProvider::new().with_section(
            "HTML",
            "navigate",
            None,
            None,
            "1. Let x be true\n2. Fetch the resource\n3. Process the response\n",
        );
        ServerState::new(ServerConfig::default(), Arc::new(provider))
    }

    fn params(uri: Url) -> CodeLensParams {
        CodeLensParams {
            text_document: TextDocumentIdentifier { uri },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        }
    }

    #[test]
    fn code_lens_reports_coverage_summary_and_missing_steps() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        let text = "// https://html.spec.whatwg.org/#navigate\n// Step 1. Let x be true\n";
        state.open_document(uri.to_string(), 1, text.to_string());

        let lenses = handle_code_lens(&mut state, params(uri)).expect("lenses");
        assert_eq!(lenses.len(), 1);
        let command = lenses[0].command.as_ref().expect("command");
        assert_eq!(command.command, "webspecLens.showCoverage");
        let args = command.arguments.as_ref().expect("arguments");
        assert_eq!(args[0], json!("navigate"));
        assert_eq!(args[1], json!(3));
        assert_eq!(args[2], json!(["2", "3"]));
    }

    #[test]
    fn code_lens_anchors_to_the_citation_line() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        let text = "\n\n// https://html.spec.whatwg.org/#navigate\n// Step 1. Let x be true\n";
        state.open_document(uri.to_string(), 1, text.to_string());

        let lenses = handle_code_lens(&mut state, params(uri)).expect("lenses");
        assert_eq!(lenses[0].range.start.line, 2);
    }

    #[test]
    fn no_citations_returns_none() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        state.open_document(uri.to_string(), 1, "plain file\n".to_string());

        assert!(handle_code_lens(&mut state, params(uri)).is_none());
    }
}
