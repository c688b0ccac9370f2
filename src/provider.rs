//! The injectable spec content store.
//!
//! [`SpecProvider`] is the boundary between this crate and whatever holds the
//! canonical WHATWG/W3C algorithm text (a network index, a local cache, or a
//! test fixture). The server never depends on a concrete implementation; it
//! only depends on this trait, following the same duck-typed boundary the
//! original `webspec_index.lsp.server.SpecProvider` protocol describes, made
//! explicit as a Rust trait object.

use thiserror::Error;

/// A registered spec whose URLs the scanner should recognise.
///
/// Example: `{ spec: "HTML", base_url: "https://html.spec.whatwg.org" }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRef {
    /// Short spec identifier, e.g. `"HTML"`.
    pub spec: String,
    /// Canonical base URL for this spec's pages.
    pub base_url: String,
}

/// A single queried spec section: an algorithm's title, kind, and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRecord {
    /// Spec identifier, e.g. `"HTML"`.
    pub spec: String,
    /// Section anchor, e.g. `"navigate"`.
    pub anchor: String,
    /// Human-readable section title, if the provider has one.
    pub title: Option<String>,
    /// Section kind (e.g. `"algorithm"`, `"dfn"`), if known.
    pub section_type: Option<String>,
    /// Markdown body text, expected to contain a numbered step list for
    /// algorithm sections.
    pub content: String,
}

/// Errors a [`SpecProvider`] implementation may report.
///
/// Per `SPEC_FULL.md` §7, callers never surface these to the user: a failed
/// query is logged at `debug` and treated as returning no data.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested `SPEC#anchor` is not known to the provider.
    #[error("unknown spec anchor: {0}")]
    UnknownAnchor(String),

    /// The provider failed for an implementation-specific reason.
    #[error("provider error: {0}")]
    Other(String),
}

/// Interface for spec data access.
///
/// Implementations may back this with a network index, an on-disk cache, or
/// (in tests) a fixed in-memory fixture. The server holds this behind an
/// `Arc<dyn SpecProvider>` so handlers can share one instance.
pub trait SpecProvider: Send + Sync {
    /// Look up a section by its `SPEC#anchor` key, e.g. `"HTML#navigate"`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the anchor is unknown or the lookup fails.
    fn query(&self, spec_anchor: &str) -> Result<SectionRecord, ProviderError>;

    /// List every spec this provider can resolve URLs for.
    ///
    /// Called once per server lifetime to build the URL-matching regex (see
    /// `analysis::scanner::build_url_pattern`).
    fn spec_urls(&self) -> Vec<SpecRef>;
}

/// A [`SpecProvider`] that recognises no specs and answers every query with
/// [`ProviderError::UnknownAnchor`].
///
/// Stands in for a real spec index (the original server backs this with a
/// PyO3-wrapped native index; this crate treats that content store as
/// injected, out-of-scope infrastructure) until one is wired up in `main`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

impl SpecProvider for NullProvider {
    fn query(&self, spec_anchor: &str) -> Result<SectionRecord, ProviderError> {
        Err(ProviderError::UnknownAnchor(spec_anchor.to_string()))
    }

    fn spec_urls(&self) -> Vec<SpecRef> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_provider_has_no_spec_urls() {
        assert!(NullProvider.spec_urls().is_empty());
    }

    #[test]
    fn null_provider_query_always_fails() {
        let err = NullProvider.query("HTML#navigate").unwrap_err();
        assert!(matches!(err, ProviderError::UnknownAnchor(_)));
    }
}
