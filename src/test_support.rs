//! Test-only fixtures shared across this crate's unit and integration tests.
//!
//! Gated behind the `test-support` feature so it can be exercised from
//! integration tests in `tests/` without becoming part of the crate's public
//! surface in release builds — mirrors the teacher's own `test_support`
//! module, unified across dev-dependency and `#[cfg(test)]` builds via the
//! self-referential dev-dependency in `Cargo.toml`.

use std::collections::HashMap;

use crate::provider::{ProviderError, SectionRecord, SpecProvider, SpecRef};

/// An in-memory [`SpecProvider`] backed by fixture data registered via
/// [`FixtureProvider::with_section`], standing in for the original's
/// frozen-JSON `FixtureProvider` test double.
#[derive(Debug, Clone, Default)]
pub struct FixtureProvider {
    sections: HashMap<String, SectionRecord>,
}

impl FixtureProvider {
    /// An empty provider with no registered sections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty provider with no registered sections.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a spec section, keyed by `spec#anchor`.
    #[must_use]
    pub fn with_section(
        mut self,
        spec: &str,
        anchor: &str,
        title: Option<String>,
        section_type: Option<String>,
        content: &str,
    ) -> Self {
        let key = format!("{spec}#{anchor}");
        self.sections.insert(
            key,
            SectionRecord {
                spec: spec.to_string(),
                anchor: anchor.to_string(),
                title,
                section_type,
                content: content.to_string(),
            },
        );
        self
    }
}

impl SpecProvider for FixtureProvider {
    fn query(&self, spec_anchor: &str) -> Result<SectionRecord, ProviderError> {
        self.sections
            .get(spec_anchor)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownAnchor(spec_anchor.to_string()))
    }

    fn spec_urls(&self) -> Vec<SpecRef> {
        let mut seen: HashMap<String, SpecRef> = HashMap::new();
        for record in self.sections.values() {
            seen.entry(record.spec.clone()).or_insert_with(|| SpecRef {
                spec: record.spec.clone(),
                base_url: format!("https://{}.spec.whatwg.org", record.spec.to_lowercase()),
            });
        }
        seen.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_provider_has_no_urls_and_fails_every_query() {
        let provider = FixtureProvider::empty();
        assert!(provider.spec_urls().is_empty());
        assert!(provider.query("HTML#navigate").is_err());
    }

    #[test]
    fn registered_section_is_queryable_and_contributes_a_url() {
        let provider = FixtureProvider::new().with_section(
            "HTML",
            "navigate",
            Some("navigate".to_string()),
            Some("Algorithm".to_string()),
            "1. Step one\n",
        );
        let record = provider.query("HTML#navigate").expect("registered section");
        assert_eq!(record.anchor, "navigate");
        assert_eq!(record.content, "1. Step one\n");

        let urls = provider.spec_urls();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].spec, "HTML");
        assert_eq!(urls[0].base_url, "https://html.spec.whatwg.org");
    }
}
