//! `textDocument/didOpen`, `didChange`, and `didClose` handlers.
//!
//! `didOpen` and `didClose` run synchronously to completion, per the
//! single-threaded cooperative concurrency model. `didChange` is the one
//! notification that schedules debounced async work: a burst of edits
//! collapses into a single re-analysis after the debounce interval elapses,
//! cancelling any still-pending one first. This mirrors the original
//! server's `asyncio.create_task`/`.cancel()` pattern.

use std::time::Duration;

use lsp_types::{DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams};

use crate::analyzer::validate_doc;
use crate::handlers::diagnostics::{compute_diagnostics, publish_diagnostics};
use crate::server::{lock_state, ServerState, SharedServerState};

/// Handle `textDocument/didOpen`: buffer the document, validate it, and
/// publish diagnostics immediately.
pub fn handle_did_open(state: &mut ServerState, params: DidOpenTextDocumentParams) {
    let doc = params.text_document;
    state.open_document(doc.uri.to_string(), doc.version, doc.text.clone());

    let validations = validate_doc(state, doc.uri.as_str(), &doc.text, doc.version);
    let diagnostics = compute_diagnostics(&validations, &doc.text, &doc.uri);
    publish_diagnostics(state, &doc.uri, diagnostics);
}

/// Handle `textDocument/didChange`: update the buffered text immediately,
/// then schedule a debounced re-analysis that replaces any still-pending one
/// for the same document.
///
/// Takes the shared state handle rather than a locked guard: the debounced
/// work runs on a spawned task outside the caller's lock scope.
pub fn handle_did_change(shared: &SharedServerState, params: DidChangeTextDocumentParams) {
    let uri = params.text_document.uri;
    let version = params.text_document.version;
    let Some(change) = params.content_changes.into_iter().next() else {
        return;
    };
    let text = change.text;

    let debounce_ms = {
        let mut state = lock_state(shared);
        state.update_document(uri.to_string(), version, text);
        state.config().debounce_ms
    };

    let shared_for_task = shared.clone();
    let uri_for_task = uri.clone();
    let join_handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(debounce_ms)).await;
        reanalyse_and_publish(&shared_for_task, &uri_for_task);
    });

    lock_state(shared).reschedule_debounce(uri.to_string(), join_handle.abort_handle());
}

/// Re-run validation for the current buffered text of `uri` and publish
/// diagnostics. Does nothing if the document has since been closed.
fn reanalyse_and_publish(shared: &SharedServerState, uri: &lsp_types::Url) {
    let mut state = lock_state(shared);
    let Some((version, text)) = state.document(uri.as_str()) else {
        return;
    };
    let text = text.to_string();
    let validations = validate_doc(&mut state, uri.as_str(), &text, version);
    let diagnostics = compute_diagnostics(&validations, &text, uri);
    publish_diagnostics(&state, uri, diagnostics);
}

/// Handle `textDocument/didClose`: cancel any pending debounce, evict every
/// per-document cache entry, and publish an empty diagnostics list to clear
/// the editor's view.
pub fn handle_did_close(state: &mut ServerState, params: DidCloseTextDocumentParams) {
    let uri = params.text_document.uri;
    state.evict_document(uri.as_str());
    publish_diagnostics(state, &uri, Vec::new());
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
    use lsp_types::{TextDocumentContentChangeEvent, TextDocumentItem, Url, VersionedTextDocumentIdentifier};
    use std::sync::Arc;

    fn test_state() -> ServerState {
        let provider = FixtureProvider::new().with_section(
            "HTML",
            "navigate",
            None,
            None,
            "1. Let x be true\n",
        );
        ServerState::new(ServerConfig::default(), Arc::new(provider))
    }

    #[test]
    fn did_open_buffers_the_document_text() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "cpp".to_string(),
                version: 1,
                text: "// Step 1. Let x be true\n".to_string(),
            },
        };
        handle_did_open(&mut state, params);
        assert_eq!(state.document(uri.as_str()), Some((1, "// Step 1. Let x be true\n")));
    }

    #[test]
    fn did_close_evicts_buffered_document() {
        let mut state = test_state();
        let uri = Url::parse("file:///t.cpp").unwrap();
        state.open_document(uri.to_string(), 1, "text".to_string());
        handle_did_close(
            &mut state,
            DidCloseTextDocumentParams {
                text_document: lsp_types::TextDocumentIdentifier { uri: uri.clone() },
            },
        );
        assert!(state.document(uri.as_str()).is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn did_change_updates_buffer_and_schedules_debounce() {
        let shared: SharedServerState = std::sync::Arc::new(std::sync::Mutex::new(test_state()));
        let uri = Url::parse("file:///t.cpp").unwrap();
        {
            let mut state = lock_state(&shared);
            state.open_document(uri.to_string(), 1, "// old\n".to_string());
        }

        let params = DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri.clone(),
                version: 2,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "// Step 1. Let x be true\n".to_string(),
            }],
        };
        handle_did_change(&shared, params);

        let state = lock_state(&shared);
        assert_eq!(
            state.document(uri.as_str()),
            Some((2, "// Step 1. Let x be true\n"))
        );
    }
}
