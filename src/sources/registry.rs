//! Registry mapping source ids to adapters.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    arxiv::ArxivSource, github::GithubSource, jsonplaceholder::JsonPlaceholderSource,
    zenodo::ZenodoSource, Source, SourceError,
};
use crate::config::Config;
use crate::utils::HttpClient;

/// Registry for all available record sources
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in source, sharing one HTTP client
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = Arc::new(HttpClient::new(config.sources.timeout())?);
        let urls = &config.sources;
        let keys = &config.api_keys;

        let mut registry = Self::new();
        registry.register(Arc::new(ZenodoSource::new(
            client.clone(),
            &urls.zenodo_url,
            keys.zenodo.clone(),
        )));
        registry.register(Arc::new(ZenodoSource::sandbox(
            client.clone(),
            &urls.zenodo_sandbox_url,
            keys.zenodo.clone(),
        )));
        registry.register(Arc::new(GithubSource::new(
            client.clone(),
            &urls.github_url,
            keys.github.clone(),
        )));
        registry.register(Arc::new(ArxivSource::new(client.clone(), &urls.arxiv_url)));
        registry.register(Arc::new(JsonPlaceholderSource::new(
            client,
            &urls.jsonplaceholder_url,
        )));

        tracing::debug!(sources = registry.len(), "source registry ready");
        Ok(registry)
    }

    /// Register a source, replacing any source with the same id
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.id().to_string(), source);
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.get(id)
    }

    /// All registered sources, ordered by id
    pub fn all(&self) -> Vec<&Arc<dyn Source>> {
        let mut sources: Vec<_> = self.sources.values().collect();
        sources.sort_by(|a, b| a.id().cmp(b.id()));
        sources
    }

    /// All source ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.sources.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn has(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{MockSource, SourceKind};

    #[test]
    fn test_builtin_sources_registered() {
        let registry = SourceRegistry::from_config(&Config::default()).unwrap();

        assert_eq!(
            registry.ids(),
            vec!["arxiv", "github", "jsonplaceholder", "zenodo", "zenodo_sandbox"]
        );
        assert!(!registry.has("nonexistent"));
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_source_kinds() {
        let registry = SourceRegistry::from_config(&Config::default()).unwrap();

        assert_eq!(registry.get("arxiv").unwrap().kind(), SourceKind::AtomFeed);
        assert_eq!(registry.get("zenodo").unwrap().kind(), SourceKind::RestApi);
        assert_eq!(registry.get("zenodo_sandbox").unwrap().name(), "Zenodo Sandbox");
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = SourceRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(MockSource::with_id("zenodo")));
        registry.register(Arc::new(MockSource::with_id("zenodo")));
        registry.register(Arc::new(MockSource::with_id("github")));

        assert_eq!(registry.len(), 2);
        let ids: Vec<_> = registry.all().iter().map(|s| s.id().to_string()).collect();
        assert_eq!(ids, vec!["github", "zenodo"]);
    }
}
