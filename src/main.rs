//! `webspec-lsp` binary: a spec-aware language server over stdio.
//!
//! Wires the `async-lsp` request/notification router to the handlers in
//! [`webspec_lsp::handlers`], backed by a single [`SharedServerState`] shared
//! between the synchronous router and the debounced re-analysis tasks
//! `didChange` schedules.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};

use async_lsp::concurrency::ConcurrencyLayer;
use async_lsp::panic::CatchUnwindLayer;
use async_lsp::router::Router;
use async_lsp::server::LifecycleLayer;
use async_lsp::tracing::TracingLayer;
use clap::Parser;
use lsp_types::{notification, request};
use tower::ServiceBuilder;
use tracing::info;

use webspec_lsp::config::{LogLevel, ServerConfig};
use webspec_lsp::handlers::{
    handle_code_lens, handle_did_change, handle_did_close, handle_did_open, handle_hover,
    handle_inlay_hint, handle_initialise, handle_initialised, handle_shutdown,
};
use webspec_lsp::logging::init_logging;
use webspec_lsp::provider::NullProvider;
use webspec_lsp::server::{lock_state, ServerState, SharedServerState};

/// A spec-aware language server that checks step comments against
/// WHATWG/W3C algorithms.
#[derive(Parser, Debug)]
#[command(name = "webspec-lsp", version, about)]
struct Args {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Debounce interval in milliseconds before re-validating a changed
    /// document.
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Jaro-Winkler similarity threshold in `[0, 1]` for a FUZZY step match.
    #[arg(long)]
    fuzzy_threshold: Option<f64>,
}

fn main() {
    let args = Args::parse();

    let log_level = args
        .log_level
        .as_deref()
        .and_then(|s| s.parse::<LogLevel>().ok());

    let config = ServerConfig::from_env()
        .unwrap_or_default()
        .apply_overrides(log_level, args.debounce_ms, args.fuzzy_threshold);
    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "starting webspec-lsp");

    if let Err(err) = run_server(config) {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}

/// Run the language server on a current-thread Tokio runtime.
fn run_server(config: ServerConfig) -> std::io::Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run_server_async(config))
}

/// Wire the router and drive the main loop over stdio until `exit`.
async fn run_server_async(config: ServerConfig) -> std::io::Result<()> {
    let (server, _client) = async_lsp::MainLoop::new_server(|client| {
        let mut state = ServerState::new(config.clone(), Arc::new(NullProvider));
        state.set_client(client.clone());
        let shared: SharedServerState = Arc::new(Mutex::new(state));

        let mut router = Router::new(shared);
        router
            .request::<request::Initialize, _>(|shared, params| {
                let result = handle_initialise(&mut lock_state(shared), params);
                std::future::ready(result)
            })
            .request::<request::Shutdown, _>(|shared, _params| {
                let result = handle_shutdown(&mut lock_state(shared));
                std::future::ready(result)
            })
            .request::<request::HoverRequest, _>(|shared, params| {
                let result = handle_hover(&mut lock_state(shared), params);
                std::future::ready(Ok(result))
            })
            .request::<request::InlayHintRequest, _>(|shared, params| {
                let result = handle_inlay_hint(&mut lock_state(shared), params);
                std::future::ready(Ok(result))
            })
            .request::<request::CodeLensRequest, _>(|shared, params| {
                let result = handle_code_lens(&mut lock_state(shared), params);
                std::future::ready(Ok(result))
            })
            .notification::<notification::Initialized>(|shared, params| {
                handle_initialised(&mut lock_state(shared), params);
                ControlFlow::Continue(())
            })
            .notification::<notification::Exit>(|_, ()| ControlFlow::Break(Ok(())))
            .notification::<notification::DidOpenTextDocument>(|shared, params| {
                handle_did_open(&mut lock_state(shared), params);
                ControlFlow::Continue(())
            })
            .notification::<notification::DidChangeTextDocument>(|shared, params| {
                handle_did_change(shared, params);
                ControlFlow::Continue(())
            })
            .notification::<notification::DidCloseTextDocument>(|shared, params| {
                handle_did_close(&mut lock_state(shared), params);
                ControlFlow::Continue(())
            });

        ServiceBuilder::new()
            .layer(TracingLayer::default())
            .layer(LifecycleLayer::default())
            .layer(CatchUnwindLayer::default())
            .layer(ConcurrencyLayer::default())
            .service(router)
    });

    #[cfg(unix)]
    let (stdin, stdout) = (
        async_lsp::stdio::PipeStdin::lock_tokio()?,
        async_lsp::stdio::PipeStdout::lock_tokio()?,
    );
    #[cfg(not(unix))]
    let (stdin, stdout) = {
        use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};
        (tokio::io::stdin().compat(), tokio::io::stdout().compat_write())
    };

    server
        .run_buffered(stdin, stdout)
        .await
        .map_err(std::io::Error::other)?;

    info!("server exited");
    Ok(())
}
