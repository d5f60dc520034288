//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::{Record, RecordBuilder, SearchQuery};
use crate::sources::{Source, SourceError};

/// A mock source that returns predefined records or a predefined failure.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    records: Mutex<Vec<Record>>,
    error: Mutex<Option<String>>,
    last_query: Mutex<Option<SearchQuery>>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    /// Create a mock source registered as `mock`.
    pub fn new() -> Self {
        Self::with_id("mock")
    }

    /// Create a mock source registered under a custom id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            records: Mutex::new(Vec::new()),
            error: Mutex::new(None),
            last_query: Mutex::new(None),
        }
    }

    /// Set the records returned by search and fetch.
    pub fn set_records(&self, records: Vec<Record>) {
        *lock(&self.records) = records;
    }

    /// Make every call fail with a network error.
    pub fn set_error(&self, message: impl Into<String>) {
        *lock(&self.error) = Some(message.into());
    }

    /// Clear the configured failure.
    pub fn clear_error(&self) {
        *lock(&self.error) = None;
    }

    /// The most recent search query received.
    pub fn last_query(&self) -> Option<SearchQuery> {
        lock(&self.last_query).clone()
    }

    fn failure(&self) -> Option<SourceError> {
        lock(&self.error).clone().map(SourceError::Network)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    fn description(&self) -> &str {
        "Predefined records for tests"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        *lock(&self.last_query) = Some(query.clone());
        if let Some(err) = self.failure() {
            return Err(err);
        }
        Ok(lock(&self.records).iter().take(query.limit).cloned().collect())
    }

    async fn fetch_by_id(&self, raw_id: &str) -> Result<Record, SourceError> {
        if let Some(err) = self.failure() {
            return Err(err);
        }
        let id = self.parse_id(raw_id);
        let suffix = format!(":{}", id);
        lock(&self.records)
            .iter()
            .find(|r| r.identifier == id || r.identifier.ends_with(&suffix))
            .cloned()
            .ok_or(SourceError::NotFound(id))
    }
}

/// Helper function to create a mock record for testing.
pub fn make_record(source: &str, native_id: &str, title: &str) -> Record {
    RecordBuilder::new(source, native_id)
        .title(title)
        .creator("Test Author")
        .description(format!("Description of {}", title))
        .datestamp("2024-01-15")
        .build()
}
