//! Spec-aware language server that checks step comments against WHATWG/W3C
//! algorithms.
//!
//! Source comments citing a spec URL (e.g.
//! `// https://html.spec.whatwg.org/#navigate`) are treated as claims about
//! the numbered steps that follow. This crate scans those citations, parses
//! the canonical algorithm text behind them (via an injected
//! [`provider::SpecProvider`]), and reports whether each step comment's text
//! matches, approximately matches, or has drifted from the spec.

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod debounce;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod provider;
pub mod server;

#[cfg(feature = "test-support")]
#[doc(hidden)]
pub mod test_support;
