//! Sync orchestration shared by the HTTP API and the CLI.
//!
//! A sync looks the source up, pulls records through the best-effort helpers and
//! hands them to the [`Importer`]. Validation problems come back as
//! [`BridgeError`]s that know their HTTP status and JSON body.

use http::StatusCode;
use serde::Serialize;
use std::sync::Arc;

use crate::models::{ImportDetail, ImportResult, SearchQuery};
use crate::oai::Importer;
use crate::sources::{fetch_best_effort, search_best_effort, SourceRegistry};

/// JSON body of a completed sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Always `"success"`: the sync ran, even if individual imports failed
    pub status: &'static str,
    pub source: String,
    pub total_records: usize,
    pub successful: usize,
    pub failed: usize,
    /// RFC 3339 completion time
    pub timestamp: String,
    pub details: Vec<ImportDetail>,
}

impl SyncReport {
    pub fn new(source: impl Into<String>, result: ImportResult) -> Self {
        Self {
            status: "success",
            source: source.into(),
            total_records: result.total,
            successful: result.successful,
            failed: result.failed,
            timestamp: chrono::Utc::now().to_rfc3339(),
            details: result.details,
        }
    }
}

/// Request-level failures of a sync
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("Unknown source or no data: {0}")]
    UnknownSource(String),

    #[error("Unknown source or no data: {0}")]
    NoData(String),

    #[error("No ID provided")]
    MissingId,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Internal { source_id: String, message: String },
}

impl BridgeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::UnknownSource(_) | BridgeError::NoData(_) | BridgeError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            BridgeError::MissingId => StatusCode::BAD_REQUEST,
            BridgeError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `{status: "error", message}`, plus `source` for internal failures
    pub fn body(&self) -> serde_json::Value {
        match self {
            BridgeError::Internal { source_id, message } => serde_json::json!({
                "status": "error",
                "message": message,
                "source": source_id,
            }),
            other => serde_json::json!({
                "status": "error",
                "message": other.to_string(),
            }),
        }
    }
}

/// Source registry plus importer; cheap to clone and shared by every request
#[derive(Debug, Clone)]
pub struct Bridge {
    registry: Arc<SourceRegistry>,
    importer: Importer,
}

impl Bridge {
    pub fn new(registry: Arc<SourceRegistry>, importer: Importer) -> Self {
        Self { registry, importer }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn importer(&self) -> &Importer {
        &self.importer
    }

    /// Search `source_id` and import every hit
    pub async fn sync(&self, source_id: &str, query: &SearchQuery) -> Result<SyncReport, BridgeError> {
        let source = self
            .registry
            .get(source_id)
            .ok_or_else(|| BridgeError::UnknownSource(source_id.to_string()))?;

        tracing::info!(source = source_id, query = %query.query, limit = query.limit, "sync started");
        let records = search_best_effort(source.as_ref(), query).await;
        if records.is_empty() {
            return Err(BridgeError::NoData(source_id.to_string()));
        }

        let result = self.importer.import_batch(&records).await;
        Ok(SyncReport::new(source_id, result))
    }

    /// Fetch one record by id, DOI or URL and import it
    pub async fn sync_specific(&self, source_id: &str, raw_id: &str) -> Result<SyncReport, BridgeError> {
        let raw_id = raw_id.trim();
        if raw_id.is_empty() {
            return Err(BridgeError::MissingId);
        }

        let Some(source) = self.registry.get(source_id) else {
            return Err(BridgeError::NotFound(raw_id.to_string()));
        };

        tracing::info!(source = source_id, id = raw_id, "specific sync started");
        let record = fetch_best_effort(source.as_ref(), raw_id)
            .await
            .ok_or_else(|| BridgeError::NotFound(raw_id.to_string()))?;

        let result = self.importer.import_batch(std::slice::from_ref(&record)).await;
        Ok(SyncReport::new(source_id, result))
    }
}
