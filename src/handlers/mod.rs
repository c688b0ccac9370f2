//! LSP request and notification handlers.
//!
//! Each submodule owns one protocol feature. Handlers are kept free of
//! transport concerns — they take a locked [`crate::server::ServerState`]
//! (or, for `didChange`, the shared handle itself to spawn the debounced
//! re-analysis task) and are wired into the `async-lsp` [`tower`] service in
//! `main`.

pub mod code_lens;
pub mod diagnostics;
pub mod hover;
pub mod inlay_hint;
pub mod lifecycle;
pub mod text_document;
pub mod util;

pub use code_lens::handle_code_lens;
pub use hover::handle_hover;
pub use inlay_hint::handle_inlay_hint;
pub use lifecycle::{handle_initialise, handle_initialised, handle_shutdown};
pub use text_document::{handle_did_change, handle_did_close, handle_did_open};
