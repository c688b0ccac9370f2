//! Core language server state: caches, provider, and config shared across
//! every LSP handler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_lsp::ClientSocket;
use lsp_types::{ClientCapabilities, ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind, WorkspaceFolder};
use regex::Regex;

use crate::analysis::coverage::CoverageResult;
use crate::analysis::scanner::{StepComment, UrlMatch};
use crate::analysis::steps::AlgorithmStep;
use crate::analysis::StepValidation;
use crate::debounce::DebounceRegistry;

/// A spec URL's scope with owned step comments, suitable for caching past
/// the lifetime of the document text it was scanned from.
pub type OwnedScope = (UrlMatch, Vec<StepComment>);
use crate::config::ServerConfig;
use crate::provider::SpecProvider;

/// A value cached alongside the document version it was computed for.
///
/// A cache hit requires an exact version match; any other version is a miss,
/// per `SPEC_FULL.md` §4.G.
type Versioned<T> = (i32, T);

/// Central state shared across all LSP handlers.
pub struct ServerState {
    /// Client capabilities received during initialisation.
    client_capabilities: Option<ClientCapabilities>,
    /// Workspace folders from the client.
    workspace_folders: Vec<WorkspaceFolder>,
    /// Whether the server has completed initialisation.
    initialised: bool,
    /// Configuration loaded from environment, CLI, and init options.
    config: ServerConfig,
    /// The injected spec content store.
    provider: Arc<dyn SpecProvider>,

    /// Lazily built regex matching any registered spec's URLs.
    url_pattern: Option<Regex>,
    /// `base_url -> spec name` lookup, built alongside `url_pattern`.
    base_url_lookup: HashMap<String, String>,

    /// Per-document URL scan cache, keyed by document URI.
    doc_urls: HashMap<String, Versioned<Vec<UrlMatch>>>,
    /// `SPEC#anchor -> section` query cache. Server-lifetime, not per-document.
    query_cache: HashMap<String, crate::provider::SectionRecord>,
    /// `anchor -> parsed step tree` cache. Server-lifetime, not per-document.
    algo_steps_cache: HashMap<String, Vec<AlgorithmStep>>,
    /// Per-document step validation cache.
    doc_validations: HashMap<String, Versioned<Vec<StepValidation>>>,
    /// Per-document scope cache (step comments grouped under their citing URL).
    doc_scopes: HashMap<String, Versioned<Vec<OwnedScope>>>,
    /// Per-document coverage cache.
    doc_coverages: HashMap<String, Versioned<Vec<(UrlMatch, CoverageResult)>>>,

    /// Open document buffers, keyed by URI, maintained via `didOpen`/
    /// `didChange`/`didClose` since the server syncs full text.
    documents: HashMap<String, Versioned<String>>,
    /// Outbound client handle, set once after the transport is wired up in
    /// `main`. `None` in tests that never register a real client.
    client: Option<ClientSocket>,
    /// Raw `initializationOptions` payload, consumed once by `initialized`.
    init_options: Option<serde_json::Value>,
    /// Debounced re-analysis tasks scheduled from `didChange`, keyed by URI.
    debounce: DebounceRegistry,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("initialised", &self.initialised)
            .field("config", &self.config)
            .field("doc_urls", &self.doc_urls.len())
            .field("doc_validations", &self.doc_validations.len())
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Create a new server state with the given configuration and provider.
    #[must_use]
    pub fn new(config: ServerConfig, provider: Arc<dyn SpecProvider>) -> Self {
        Self {
            client_capabilities: None,
            workspace_folders: Vec::new(),
            initialised: false,
            config,
            provider,
            url_pattern: None,
            base_url_lookup: HashMap::new(),
            doc_urls: HashMap::new(),
            query_cache: HashMap::new(),
            algo_steps_cache: HashMap::new(),
            doc_validations: HashMap::new(),
            doc_scopes: HashMap::new(),
            doc_coverages: HashMap::new(),
            documents: HashMap::new(),
            client: None,
            init_options: None,
            debounce: DebounceRegistry::new(),
        }
    }

    /// Store client capabilities received during initialisation.
    pub fn set_client_capabilities(&mut self, capabilities: ClientCapabilities) {
        self.client_capabilities = Some(capabilities);
    }

    /// Access the stored client capabilities, if any.
    #[must_use]
    pub fn client_capabilities(&self) -> Option<&ClientCapabilities> {
        self.client_capabilities.as_ref()
    }

    /// Store workspace folders provided by the client.
    pub fn set_workspace_folders(&mut self, folders: Vec<WorkspaceFolder>) {
        self.workspace_folders = folders;
    }

    /// Access the workspace folders provided by the client.
    #[must_use]
    pub fn workspace_folders(&self) -> &[WorkspaceFolder] {
        &self.workspace_folders
    }

    /// Access the current server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Override the fuzzy-match threshold, clamped to `[0, 1]`.
    ///
    /// Called from the `initialized` handler when the client supplies
    /// `initializationOptions.fuzzyThreshold`.
    pub fn set_fuzzy_threshold(&mut self, threshold: f64) {
        self.config = self.config.clone().with_fuzzy_threshold(threshold);
    }

    /// Access the injected spec provider.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn SpecProvider> {
        &self.provider
    }

    /// Mark the server as initialised.
    pub fn mark_initialised(&mut self) {
        self.initialised = true;
    }

    /// Check if the server is initialised.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Lazily build the URL-matching regex from the provider's registered
    /// specs. A no-op after the first call.
    pub fn ensure_url_pattern(&mut self) {
        if self.url_pattern.is_none() {
            let urls = self.provider.spec_urls();
            self.url_pattern = Some(crate::analysis::scanner::build_url_pattern(&urls));
            self.base_url_lookup = crate::analysis::scanner::build_spec_lookup(&urls);
        }
    }

    /// The URL-matching regex, built on first use.
    #[must_use]
    pub fn url_pattern(&self) -> Option<&Regex> {
        self.url_pattern.as_ref()
    }

    /// The `base_url -> spec` lookup, built alongside the URL pattern.
    #[must_use]
    pub fn base_url_lookup(&self) -> &HashMap<String, String> {
        &self.base_url_lookup
    }

    /// Cached URL scan for `uri` at `version`, if present.
    #[must_use]
    pub fn cached_doc_urls(&self, uri: &str, version: i32) -> Option<&Vec<UrlMatch>> {
        self.doc_urls
            .get(uri)
            .and_then(|(v, matches)| (*v == version).then_some(matches))
    }

    /// Store a freshly computed URL scan for `uri` at `version`.
    pub fn cache_doc_urls(&mut self, uri: String, version: i32, matches: Vec<UrlMatch>) {
        self.doc_urls.insert(uri, (version, matches));
    }

    /// Cached query result for a `SPEC#anchor` key, if present.
    #[must_use]
    pub fn cached_query(&self, key: &str) -> Option<&crate::provider::SectionRecord> {
        self.query_cache.get(key)
    }

    /// Store a query result for a `SPEC#anchor` key.
    pub fn cache_query(&mut self, key: String, record: crate::provider::SectionRecord) {
        self.query_cache.insert(key, record);
    }

    /// Cached parsed step tree for an algorithm anchor, if present.
    #[must_use]
    pub fn cached_algo_steps(&self, anchor: &str) -> Option<&Vec<AlgorithmStep>> {
        self.algo_steps_cache.get(anchor)
    }

    /// Store a parsed step tree for an algorithm anchor.
    pub fn cache_algo_steps(&mut self, anchor: String, steps: Vec<AlgorithmStep>) {
        self.algo_steps_cache.insert(anchor, steps);
    }

    /// Cached step validations for `uri` at `version`, if present.
    #[must_use]
    pub fn cached_doc_validations(&self, uri: &str, version: i32) -> Option<&Vec<StepValidation>> {
        self.doc_validations
            .get(uri)
            .and_then(|(v, vals)| (*v == version).then_some(vals))
    }

    /// Store freshly computed step validations for `uri` at `version`.
    pub fn cache_doc_validations(&mut self, uri: String, version: i32, validations: Vec<StepValidation>) {
        self.doc_validations.insert(uri, (version, validations));
    }

    /// Cached scopes for `uri` at `version`, if present.
    #[must_use]
    pub fn cached_doc_scopes(&self, uri: &str, version: i32) -> Option<&Vec<OwnedScope>> {
        self.doc_scopes
            .get(uri)
            .and_then(|(v, scopes)| (*v == version).then_some(scopes))
    }

    /// Store freshly computed scopes for `uri` at `version`.
    pub fn cache_doc_scopes(&mut self, uri: String, version: i32, scopes: Vec<OwnedScope>) {
        self.doc_scopes.insert(uri, (version, scopes));
    }

    /// Cached coverage results for `uri` at `version`, if present.
    #[must_use]
    pub fn cached_doc_coverages(&self, uri: &str, version: i32) -> Option<&Vec<(UrlMatch, CoverageResult)>> {
        self.doc_coverages
            .get(uri)
            .and_then(|(v, covs)| (*v == version).then_some(covs))
    }

    /// Store freshly computed coverage results for `uri` at `version`.
    pub fn cache_doc_coverages(&mut self, uri: String, version: i32, coverages: Vec<(UrlMatch, CoverageResult)>) {
        self.doc_coverages.insert(uri, (version, coverages));
    }

    /// Evict every per-document cache entry for `uri`.
    ///
    /// Called on `textDocument/didClose`; the server-lifetime query and
    /// algorithm-step caches are left untouched.
    pub fn evict_document(&mut self, uri: &str) {
        self.doc_urls.remove(uri);
        self.doc_validations.remove(uri);
        self.doc_scopes.remove(uri);
        self.doc_coverages.remove(uri);
        self.documents.remove(uri);
        self.cancel_debounce(uri);
    }

    /// Record a newly opened document's text at its initial version.
    pub fn open_document(&mut self, uri: String, version: i32, text: String) {
        self.documents.insert(uri, (version, text));
    }

    /// Replace a document's text after a full-sync `didChange`.
    pub fn update_document(&mut self, uri: String, version: i32, text: String) {
        self.documents.insert(uri, (version, text));
    }

    /// Drop a document's buffered text on `didClose`.
    pub fn close_document(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    /// The buffered version and text for an open document, if any.
    #[must_use]
    pub fn document(&self, uri: &str) -> Option<(i32, &str)> {
        self.documents.get(uri).map(|(v, text)| (*v, text.as_str()))
    }

    /// Just the buffered text for an open document, if any.
    #[must_use]
    pub fn document_text(&self, uri: &str) -> Option<&str> {
        self.documents.get(uri).map(|(_, text)| text.as_str())
    }

    /// Store the outbound client handle, available once the transport is set
    /// up in `main`.
    pub fn set_client(&mut self, client: ClientSocket) {
        self.client = Some(client);
    }

    /// The outbound client handle, if one has been registered.
    #[must_use]
    pub fn client(&self) -> Option<&ClientSocket> {
        self.client.as_ref()
    }

    /// Stash the raw `initializationOptions` payload from `initialize`, read
    /// back once by the `initialized` handler.
    pub fn set_init_options(&mut self, options: Option<serde_json::Value>) {
        self.init_options = options;
    }

    /// Consume the stashed `initializationOptions` payload.
    pub fn take_init_options(&mut self) -> Option<serde_json::Value> {
        self.init_options.take()
    }

    /// Reschedule the debounced re-analysis task for `uri`, cancelling any
    /// previous one still pending.
    pub fn reschedule_debounce(&mut self, uri: String, handle: tokio::task::AbortHandle) {
        self.debounce.reschedule(uri, handle);
    }

    /// Cancel a pending debounced re-analysis task for `uri`, if any.
    pub fn cancel_debounce(&mut self, uri: &str) {
        self.debounce.cancel(uri);
    }
}

/// `ServerState` shared between the synchronous router handlers and the
/// spawned, debounce-delayed re-analysis tasks.
pub type SharedServerState = Arc<Mutex<ServerState>>;

/// Lock `state`, recovering the inner value if a prior holder panicked while
/// holding the lock rather than propagating the poison.
#[must_use]
pub fn lock_state(state: &SharedServerState) -> MutexGuard<'_, ServerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build the server capabilities advertised to the client.
#[must_use]
pub fn build_server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        hover_provider: Some(lsp_types::HoverProviderCapability::Simple(true)),
        inlay_hint_provider: Some(lsp_types::OneOf::Left(true)),
        code_lens_provider: Some(lsp_types::CodeLensOptions {
            resolve_provider: Some(false),
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixtureProvider;

    fn test_state() -> ServerState {
        ServerState::new(ServerConfig::default(), Arc::new(FixtureProvider::empty()))
    }

    #[test]
    fn new_state_is_not_initialised() {
        let state = test_state();
        assert!(!state.is_initialised());
        assert!(state.client_capabilities().is_none());
        assert!(state.workspace_folders().is_empty());
    }

    #[test]
    fn mark_initialised_sets_flag() {
        let mut state = test_state();
        state.mark_initialised();
        assert!(state.is_initialised());
    }

    #[test]
    fn doc_cache_misses_on_version_change() {
        let mut state = test_state();
        state.cache_doc_urls("file:///a.rs".to_string(), 1, vec![]);
        assert!(state.cached_doc_urls("file:///a.rs", 1).is_some());
        assert!(state.cached_doc_urls("file:///a.rs", 2).is_none());
    }

    #[test]
    fn evict_document_clears_all_per_document_caches() {
        let mut state = test_state();
        state.cache_doc_urls("file:///a.rs".to_string(), 1, vec![]);
        state.cache_doc_validations("file:///a.rs".to_string(), 1, vec![]);
        state.cache_doc_scopes("file:///a.rs".to_string(), 1, vec![]);
        state.cache_doc_coverages("file:///a.rs".to_string(), 1, vec![]);

        state.evict_document("file:///a.rs");

        assert!(state.cached_doc_urls("file:///a.rs", 1).is_none());
        assert!(state.cached_doc_validations("file:///a.rs", 1).is_none());
        assert!(state.cached_doc_scopes("file:///a.rs", 1).is_none());
        assert!(state.cached_doc_coverages("file:///a.rs", 1).is_none());
    }

    #[test]
    fn set_fuzzy_threshold_clamps_and_applies() {
        let mut state = test_state();
        state.set_fuzzy_threshold(1.5);
        assert!((state.config().fuzzy_threshold - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn build_server_capabilities_advertises_full_sync_and_signals() {
        let capabilities = build_server_capabilities();
        assert!(capabilities.hover_provider.is_some());
        assert!(capabilities.inlay_hint_provider.is_some());
        assert!(capabilities.code_lens_provider.is_some());
    }
}
