//! Source adapters for the external APIs records are pulled from.
//!
//! This module defines the [`Source`] trait that every adapter implements. The
//! [`SourceRegistry`] maps source ids (as used in `/sync/{source}`) to adapters.
//!
//! # Available Sources
//!
//! | id | API | Wire format |
//! |---|---|---|
//! | `zenodo` | Zenodo records API | JSON |
//! | `zenodo_sandbox` | Zenodo sandbox records API | JSON |
//! | `github` | GitHub repository search | JSON |
//! | `arxiv` | arXiv query API | Atom |
//! | `jsonplaceholder` | JSONPlaceholder posts (demo) | JSON |
//!
//! # Failure Policy
//!
//! Adapters report failures as [`SourceError`]. Callers that only need records use
//! [`search_best_effort`] and [`fetch_best_effort`], which log the error and report
//! it as "no records". That makes an unreachable source indistinguishable from a
//! search with no hits; callers that need the difference use the trait methods
//! directly.

mod arxiv;
mod github;
mod jsonplaceholder;
mod registry;
mod zenodo;

pub mod mock;

pub use arxiv::ArxivSource;
pub use github::GithubSource;
pub use jsonplaceholder::JsonPlaceholderSource;
pub use mock::MockSource;
pub use registry::SourceRegistry;
pub use zenodo::ZenodoSource;

use crate::models::{Record, SearchQuery};
use async_trait::async_trait;
use serde::Serialize;

/// Wire format of a source's API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    RestApi,
    AtomFeed,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::RestApi => "rest_api",
            SourceKind::AtomFeed => "atom_feed",
        }
    }
}

/// The Source trait defines the interface for all record sources.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `Source`
/// 2. Map the API's items through [`crate::models::RecordBuilder`] so defaults and
///    truncation stay identical across sources
/// 3. Add the source to [`SourceRegistry::from_config`]
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier used in routes and record identifiers
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// One-line description shown in the source listing
    fn description(&self) -> &str;

    fn kind(&self) -> SourceKind {
        SourceKind::RestApi
    }

    /// Search the source, returning at most `query.limit` records in the source's
    /// native order
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError>;

    /// Fetch one record by its native id, DOI or URL
    async fn fetch_by_id(&self, raw_id: &str) -> Result<Record, SourceError>;

    /// Normalize a user-supplied id, DOI or URL to the source's native id
    fn parse_id(&self, raw_id: &str) -> String {
        raw_id.trim().to_string()
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (XML, JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Non-success status from the source
    #[error("API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

/// Search, treating any failure as "no records"
pub async fn search_best_effort(source: &dyn Source, query: &SearchQuery) -> Vec<Record> {
    match source.search(query).await {
        Ok(mut records) => {
            records.truncate(query.limit);
            records
        }
        Err(e) => {
            tracing::warn!(source = source.id(), error = %e, "search failed");
            Vec::new()
        }
    }
}

/// Fetch one record, treating any failure as "not found"
pub async fn fetch_best_effort(source: &dyn Source, raw_id: &str) -> Option<Record> {
    match source.fetch_by_id(raw_id).await {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(source = source.id(), id = raw_id, error = %e, "fetch failed");
            None
        }
    }
}

/// Turn a non-success response into a [`SourceError`], keeping the body for context
pub(crate) async fn check_status(
    response: reqwest::Response,
    source_name: &str,
) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
        Err(SourceError::NotFound(format!("{} returned 404", source_name)))
    } else {
        Err(SourceError::Api(format!(
            "{} API returned status {}: {}",
            source_name, status, text
        )))
    }
}

/// Non-empty path segments of a URL, tolerating a missing scheme
pub(crate) fn path_segments(raw: &str) -> Vec<String> {
    let parsed = url::Url::parse(raw).or_else(|_| url::Url::parse(&format!("https://{}", raw)));
    parsed
        .ok()
        .and_then(|url| {
            url.path_segments().map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
        })
        .unwrap_or_default()
}
