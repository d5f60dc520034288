//! Search request model.

use serde::{Deserialize, Serialize};

/// Page-size ceiling shared by every supported source
pub const MAX_PAGE_SIZE: usize = 100;

/// Limit used when the caller does not give one
pub const DEFAULT_LIMIT: usize = 5;

/// Search parameters handed to a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query; blank means "use the source's default query"
    pub query: String,

    /// Maximum number of records, always within `1..=MAX_PAGE_SIZE`
    pub limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the limit, clamped into `1..=MAX_PAGE_SIZE`
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// The trimmed query, or `default` when blank
    pub fn query_or<'a>(&'a self, default: &'a str) -> &'a str {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            default
        } else {
            trimmed
        }
    }
}

/// Parse a user-supplied limit the way the web form sends it: anything that is not
/// a number falls back to [`DEFAULT_LIMIT`], negatives and zero clamp to one.
pub fn parse_limit(raw: Option<&str>) -> usize {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(n) if n < 1 => 1,
        Some(n) => usize::try_from(n).unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE),
        None => DEFAULT_LIMIT,
    }
}
