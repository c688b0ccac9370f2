//! `textDocument/hover`: spec URL citations and step comment validations.
//!
//! A hover over a spec URL citation takes priority and shows the queried
//! section's content. A hover over a numbered step comment shows its match
//! result against the canonical algorithm step, mirroring the original
//! server's `hover` handler and `build_hover_content` formatter.

use lsp_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind};

use crate::analysis::matcher::MatchResult;
use crate::analyzer::{query_spec, scan_doc, validate_doc};
use crate::analysis::scanner::find_url_at_position;
use crate::handlers::util::{byte_col_to_utf16_col, line_text, span_to_lsp_range, step_label, utf16_col_to_byte_col};
use crate::provider::SectionRecord;
use crate::server::ServerState;

/// Handle `textDocument/hover`.
#[must_use]
pub fn handle_hover(state: &mut ServerState, params: HoverParams) -> Option<Hover> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;
    let (version, text) = state.document(uri.as_str())?;
    let text = text.to_string();

    let line = line_text(&text, position.line);
    let byte_col = utf16_col_to_byte_col(line, position.character);

    let matches = scan_doc(state, uri.as_str(), &text, version);
    if let Some(url_match) = find_url_at_position(&matches, position.line, byte_col) {
        if let Some(record) = query_spec(state, &url_match.spec, &url_match.anchor) {
            let start = byte_col_to_utf16_col(&text, url_match.line as usize, url_match.col_start as usize);
            let end = byte_col_to_utf16_col(&text, url_match.line as usize, url_match.col_end as usize);
            return Some(Hover {
                contents: HoverContents::Markup(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: build_hover_content(&record),
                }),
                range: Some(lsp_types::Range {
                    start: lsp_types::Position::new(url_match.line, start),
                    end: lsp_types::Position::new(url_match.line, end),
                }),
            });
        }
    }

    let validations = validate_doc(state, uri.as_str(), &text, version);
    for v in &validations {
        if v.step.line != position.line {
            continue;
        }
        let start_utf16 = byte_col_to_utf16_col(&text, v.step.line as usize, v.step.col_start as usize);
        let end_utf16 = byte_col_to_utf16_col(&text, v.step.line as usize, v.step.col_end as usize);
        if position.character < start_utf16 || position.character > end_utf16 {
            continue;
        }

        let label = step_label(&v.step.number);
        let markdown = match v.result {
            MatchResult::Exact => format!("**Step {label}** — exact match"),
            MatchResult::Fuzzy => {
                let mut md = format!("**Step {label}** — fuzzy match");
                if !v.spec_text.is_empty() {
                    md.push_str(&format!("\n\n**Spec:** {}", v.spec_text));
                }
                md
            }
            MatchResult::NotFound => {
                format!("**Step {label}** — not found in `{}`", v.algo_name)
            }
            MatchResult::Mismatch => {
                let mut md = format!("**Step {label}** — text differs from spec");
                if !v.spec_text.is_empty() {
                    md.push_str(&format!("\n\n**Expected:** {}", v.spec_text));
                }
                md
            }
        };

        let end_line = v.step.end_line.unwrap_or(v.step.line);
        let range = span_to_lsp_range(&text, v.step.line, v.step.col_start, end_line, v.step.col_end);
        return Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: markdown,
            }),
            range: Some(range),
        });
    }

    None
}

/// Format a queried spec section as markdown for a hover tooltip.
#[must_use]
pub fn build_hover_content(record: &SectionRecord) -> String {
    let mut parts = Vec::new();

    let heading = record.title.clone().unwrap_or_else(|| record.anchor.clone());
    if !heading.is_empty() {
        parts.push(format!("## {heading}"));
    }

    if let Some(section_type) = &record.section_type {
        parts.push(format!("*{section_type}* | {}#{}", record.spec, record.anchor));
    }

    if !record.content.is_empty() {
        parts.push(record.content.clone());
    }

    parts.join("\n\n")
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::test_support::FixtureProvider;
    use lsp_types::{Position, TextDocumentIdentifier, TextDocumentPositionParams, Url};
    use std::sync::Arc;

    fn test_state() -> ServerState {
        let provider = FixtureProvider::new().with_section(
            "HTML",
            "navigate",
            Some("navigate".to_string()),
            Some("Algorithm".to_string()),
            "1. Let x be true\n2. Fetch the resource\n",
        );
        ServerState::new(ServerConfig::default(), Arc::new(provider))
    }

    fn hover_params(uri: Url, line: u32, character: u32) -> HoverParams {
        HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri },
                position: Position::new(line, character),
            },
            work_done_progress_params: Default::default(),
        }
    }

    #[test]
    fn build_hover_content_formats_heading_type_and_body() {
        let record = SectionRecord {
            spec: "HTML".to_string(),
            anchor: "navigate".to_string(),
            title: Some("navigate".to_string()),
            section_type: Some("Algorithm".to_string()),
            content: "1. Step one".to_string(),
        };
        let md = build_hover_content(&record);
        assert_eq!(md, "## navigate\n\n*Algorithm* | HTML#navigate\n\n1. Step one");
    }

    #[test]
    fn build_hover_content_falls_back_to_anchor_heading() {
        let record = SectionRecord {
            spec: "HTML".to_string(),
            anchor: "navigate".to_string(),
            title: None,
            section_type: None,
            content: String::new(),
        };
        assert_eq!(build_hover_content(&record), "## navigate");
    }

    #[test]
    fn hover_over_spec_url_shows_section_content() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        let text = "// https://html.spec.whatwg.org/#navigate\n";
        state.open_document(uri.to_string(), 1, text.to_string());

        let hover = handle_hover(&mut state, hover_params(uri, 0, 10)).expect("hover result");
        match hover.contents {
            HoverContents::Markup(markup) => assert!(markup.value.contains("navigate")),
            _ => panic!("expected markup contents"),
        }
    }

    #[test]
    fn hover_over_exact_step_comment_reports_exact_match() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        let text = "// https://html.spec.whatwg.org/#navigate\n// Step 1. Let x be true\n";
        state.open_document(uri.to_string(), 1, text.to_string());

        let hover = handle_hover(&mut state, hover_params(uri, 1, 5)).expect("hover result");
        match hover.contents {
            HoverContents::Markup(markup) => assert!(markup.value.contains("exact match")),
            _ => panic!("expected markup contents"),
        }
    }

    #[test]
    fn hover_outside_any_match_returns_none() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        let text = "plain text with nothing interesting\n";
        state.open_document(uri.to_string(), 1, text.to_string());

        assert!(handle_hover(&mut state, hover_params(uri, 0, 5)).is_none());
    }
}
