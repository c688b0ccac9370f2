//! `textDocument/inlayHint`: inline ✓/⚠ markers for step validations.

use lsp_types::{InlayHint, InlayHintKind, InlayHintLabel, InlayHintParams, MarkupContent, MarkupKind, Position};

use crate::analysis::matcher::MatchResult;
use crate::analyzer::validate_doc;
use crate::handlers::util::{byte_col_to_utf16_col, step_label};
use crate::server::ServerState;

/// Handle `textDocument/inlayHint`.
///
/// Returns one hint per step comment within `params.range`'s line span: a
/// `✓` for EXACT/FUZZY matches, a `⚠` for NOT_FOUND/MISMATCH, positioned
/// just after the comment's numbered step text.
#[must_use]
pub fn handle_inlay_hint(state: &mut ServerState, params: InlayHintParams) -> Option<Vec<InlayHint>> {
    let uri = params.text_document.uri;
    let (version, text) = state.document(uri.as_str())?;
    let text = text.to_string();

    let validations = validate_doc(state, uri.as_str(), &text, version);
    if validations.is_empty() {
        return None;
    }

    let range_start = params.range.start.line;
    let range_end = params.range.end.line;

    let mut hints = Vec::new();
    for v in &validations {
        if v.step.line < range_start || v.step.line > range_end {
            continue;
        }

        let label = step_label(&v.step.number);
        let (marker, kind, tooltip) = match v.result {
            MatchResult::Exact => (
                " \u{2713}",
                InlayHintKind::TYPE,
                Some(format!("**Step {label}** — exact match")),
            ),
            MatchResult::Fuzzy => {
                let tooltip = (!v.spec_text.is_empty())
                    .then(|| format!("**Step {label}** — fuzzy match\n\n**Spec:** {}", v.spec_text));
                (" \u{2713}", InlayHintKind::TYPE, tooltip)
            }
            MatchResult::NotFound => (
                " \u{26a0}",
                InlayHintKind::PARAMETER,
                Some(format!("**Step {label}** — not found in `{}`", v.algo_name)),
            ),
            MatchResult::Mismatch => {
                let mut md = format!("**Step {label}** — text differs from spec");
                if !v.spec_text.is_empty() {
                    md.push_str(&format!("\n\n**Expected:** {}", v.spec_text));
                }
                (" \u{26a0}", InlayHintKind::PARAMETER, Some(md))
            }
        };

        let hint_line = v.step.end_line.unwrap_or(v.step.line);
        let character = byte_col_to_utf16_col(&text, hint_line as usize, v.step.col_end as usize);

        hints.push(InlayHint {
            position: Position::new(hint_line, character),
            label: InlayHintLabel::String(marker.to_string()),
            kind: Some(kind),
            text_edits: None,
            tooltip: tooltip.map(|value| {
                lsp_types::InlayHintTooltip::MarkupContent(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value,
                })
            }),
            padding_left: Some(true),
            padding_right: None,
            data: None,
        });
    }

    (!hints.is_empty()).then_some(hints)
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
    use lsp_types::{Range, TextDocumentIdentifier, Url};
    use std::sync::Arc;

    fn test_state() -> ServerState {
        let provider = FixtureProvider::new().with_section(
            "HTML",
            "navigate",
            None,
            None,
            "1. Let x be true\n2. Fetch the resource\n",
        );
        ServerState::new(ServerConfig::default(), Arc::new(provider))
    }

    fn params(uri: Url, start: u32, end: u32) -> InlayHintParams {
        InlayHintParams {
            text_document: TextDocumentIdentifier { uri },
            range: Range::new(Position::new(start, 0), Position::new(end, 0)),
            work_done_progress_params: Default::default(),
        }
    }

    #[test]
    fn exact_step_gets_checkmark_hint() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        let text = "// https://html.spec.whatwg.org/#navigate\n// Step 1. Let x be true\n";
        state.open_document(uri.to_string(), 1, text.to_string());

        let hints = handle_inlay_hint(&mut state, params(uri, 0, 5)).expect("hints");
        assert_eq!(hints.len(), 1);
        match &hints[0].label {
            InlayHintLabel::String(s) => assert!(s.contains('\u{2713}')),
            InlayHintLabel::LabelParts(_) => panic!("expected string label"),
        }
    }

    #[test]
    fn not_found_step_gets_warning_hint() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        let text = "// https://html.spec.whatwg.org/#navigate\n// Step 99. nope\n";
        state.open_document(uri.to_string(), 1, text.to_string());

        let hints = handle_inlay_hint(&mut state, params(uri, 0, 5)).expect("hints");
        assert_eq!(hints.len(), 1);
        match &hints[0].label {
            InlayHintLabel::String(s) => assert!(s.contains('\u{26a0}')),
            InlayHintLabel::LabelParts(_) => panic!("expected string label"),
        }
    }

    #[test]
    fn hints_outside_the_requested_range_are_excluded() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        let text = "// https://html.spec.whatwg.org/#navigate\n// Step 1. Let x be true\n";
        state.open_document(uri.to_string(), 1, text.to_string());

        assert!(handle_inlay_hint(&mut state, params(uri, 5, 10)).is_none());
    }

    #[test]
    fn no_validations_returns_none() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        let text = "plain file, nothing cited\n";
        state.open_document(uri.to_string(), 1, text.to_string());

        assert!(handle_inlay_hint(&mut state, params(uri, 0, 5)).is_none());
    }
}
