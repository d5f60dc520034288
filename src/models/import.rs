//! Per-batch import report.

use serde::{Deserialize, Serialize};

use super::record::truncate_chars;

/// Display length of titles in import details
pub const DETAIL_TITLE_LIMIT: usize = 80;

/// Outcome of delivering one record to the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Failed,
}

/// One line of an import report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDetail {
    pub identifier: String,
    pub status: ImportStatus,
    /// Record title, cut to [`DETAIL_TITLE_LIMIT`] characters
    pub title: String,
    /// Sink error text or local failure message
    pub error: Option<String>,
}

impl ImportDetail {
    pub fn success(identifier: impl Into<String>, title: &str) -> Self {
        Self {
            identifier: identifier.into(),
            status: ImportStatus::Success,
            title: truncate_chars(title, DETAIL_TITLE_LIMIT),
            error: None,
        }
    }

    pub fn failed(identifier: impl Into<String>, title: &str, error: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            status: ImportStatus::Failed,
            title: truncate_chars(title, DETAIL_TITLE_LIMIT),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ImportStatus::Success
    }
}

/// Aggregated result of importing a batch of records
///
/// Counters are only updated through [`ImportResult::push`], which keeps
/// `successful + failed == total == details.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub details: Vec<ImportDetail>,
}

impl ImportResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a detail in delivery order
    pub fn push(&mut self, detail: ImportDetail) {
        self.total += 1;
        if detail.is_success() {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.details.push(detail);
    }

    pub fn is_consistent(&self) -> bool {
        self.successful + self.failed == self.total && self.total == self.details.len()
    }
}
