//! LSP lifecycle handlers for initialisation and shutdown.

use async_lsp::ResponseError;
use lsp_types::{InitializeParams, InitializeResult, InitializedParams, ServerInfo};
use tracing::info;

use crate::error::ServerError;
use crate::server::{build_server_capabilities, ServerState};

/// Handle the `initialize` request from the client.
///
/// Stores client capabilities and workspace folders, stashes any
/// `initializationOptions` payload for [`handle_initialised`] to consume, and
/// returns the server's capabilities. Per the LSP specification, this must
/// be the first request sent by the client.
///
/// # Errors
///
/// Returns a `ResponseError` if the server has already been initialised.
pub fn handle_initialise(
    state: &mut ServerState,
    params: InitializeParams,
) -> Result<InitializeResult, ResponseError> {
    if state.is_initialised() {
        return Err(response_error(
            &ServerError::AlreadyInitialised,
            async_lsp::ErrorCode::INVALID_REQUEST,
        ));
    }

    state.set_client_capabilities(params.capabilities);
    if let Some(folders) = params.workspace_folders {
        state.set_workspace_folders(folders);
    }
    state.set_init_options(params.initialization_options);

    Ok(InitializeResult {
        capabilities: build_server_capabilities(),
        server_info: Some(ServerInfo {
            name: "webspec-lsp".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    })
}

/// Handle the `initialized` notification from the client.
///
/// Reads `fuzzyThreshold` from the stashed `initializationOptions` payload,
/// if present and in `[0, 1]`, then marks the server as fully initialised.
pub fn handle_initialised(state: &mut ServerState, _params: InitializedParams) {
    if let Some(options) = state.take_init_options() {
        if let Some(threshold) = options.get("fuzzyThreshold").and_then(serde_json::Value::as_f64)
        {
            if (0.0..=1.0).contains(&threshold) {
                state.set_fuzzy_threshold(threshold);
            }
        }
    }
    state.mark_initialised();
    info!("server initialised");
}

/// Handle the `shutdown` request from the client.
///
/// Per the LSP specification, the server should not exit until it also
/// receives the `exit` notification.
///
/// # Errors
///
/// Currently always returns `Ok(())`.
pub fn handle_shutdown(_state: &mut ServerState) -> Result<(), ResponseError> {
    info!("shutdown request received");
    Ok(())
}

/// Convert a server error to an LSP response error.
fn response_error(err: &ServerError, code: async_lsp::ErrorCode) -> ResponseError {
    ResponseError::new(code, err.to_string())
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
    use lsp_types::ClientCapabilities;
    use std::sync::Arc;

    fn test_state() -> ServerState {
        ServerState::new(ServerConfig::default(), Arc::new(FixtureProvider::empty()))
    }

    fn init_params() -> InitializeParams {
        InitializeParams {
            capabilities: ClientCapabilities::default(),
            workspace_folders: None,
            ..Default::default()
        }
    }

    #[test]
    fn handle_initialise_stores_client_capabilities() {
        let mut state = test_state();
        let result = handle_initialise(&mut state, init_params());
        assert!(result.is_ok());
        assert!(state.client_capabilities().is_some());
    }

    #[test]
    fn handle_initialise_returns_server_info() {
        let mut state = test_state();
        let result = handle_initialise(&mut state, init_params()).expect("should succeed");
        let info = result.server_info.expect("should have server info");
        assert_eq!(info.name, "webspec-lsp");
    }

    #[test]
    fn handle_initialise_fails_when_already_initialised() {
        let mut state = test_state();
        state.mark_initialised();
        assert!(handle_initialise(&mut state, init_params()).is_err());
    }

    #[test]
    fn handle_initialised_marks_state_as_initialised() {
        let mut state = test_state();
        assert!(!state.is_initialised());
        handle_initialised(&mut state, InitializedParams {});
        assert!(state.is_initialised());
    }

    #[test]
    fn handle_initialised_applies_fuzzy_threshold_from_init_options() {
        let mut state = test_state();
        state.set_init_options(Some(serde_json::json!({ "fuzzyThreshold": 0.5 })));
        handle_initialised(&mut state, InitializedParams {});
        assert!((state.config().fuzzy_threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn handle_initialised_ignores_out_of_range_fuzzy_threshold() {
        let mut state = test_state();
        state.set_init_options(Some(serde_json::json!({ "fuzzyThreshold": 1.5 })));
        handle_initialised(&mut state, InitializedParams {});
        assert!((state.config().fuzzy_threshold - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn handle_shutdown_returns_ok() {
        let mut state = test_state();
        assert!(handle_shutdown(&mut state).is_ok());
    }
}
