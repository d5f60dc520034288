//! arXiv preprint source.

use async_trait::async_trait;
use feed_rs::parser;
use std::sync::Arc;

use crate::models::{Record, RecordBuilder, SearchQuery};
use crate::sources::{check_status, Source, SourceError, SourceKind};
use crate::utils::HttpClient;

const DEFAULT_QUERY: &str = "machine learning";

/// arXiv preprint source
///
/// The query API answers with an Atom feed; entries whose id is not an `/abs/` URL
/// (arXiv reports errors as entries) are skipped.
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl ArxivSource {
    /// `base_url` is the query endpoint, e.g. `http://export.arxiv.org/api/query`
    pub fn new(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Parse an arXiv ID from various formats
    ///
    /// Handles formats like:
    /// - "2301.12345"
    /// - "2301.12345v1" (version is stripped)
    /// - "arXiv:2301.12345"
    /// - "https://arxiv.org/abs/2301.12345v1"
    /// - "https://arxiv.org/pdf/2301.12345v2.pdf"
    /// - "math.GT/0104020" (old style, case preserved)
    pub fn parse_arxiv_id(raw: &str) -> String {
        let raw = raw.trim();

        let id = if raw.to_ascii_lowercase().contains("arxiv.org") {
            if let Some(pos) = raw.find("/abs/") {
                &raw[pos + 5..]
            } else if let Some(pos) = raw.find("/pdf/") {
                let rest = &raw[pos + 5..];
                rest.strip_suffix(".pdf").unwrap_or(rest)
            } else {
                raw
            }
        } else {
            raw
        };

        let id = match id.get(..6) {
            Some(prefix) if prefix.eq_ignore_ascii_case("arxiv:") => &id[6..],
            _ => id,
        };
        let id = id.split(['?', '#']).next().unwrap_or(id).trim_matches('/');

        strip_version(id).to_string()
    }

    /// Parse arXiv Atom feed entry into a record
    fn parse_entry(entry: &feed_rs::model::Entry) -> Option<Record> {
        let (_, abs) = entry.id.split_once("/abs/")?;
        let arxiv_id = strip_version(abs.trim_matches('/'));
        if arxiv_id.is_empty() {
            return None;
        }

        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.as_str())
            .unwrap_or("");

        let summary = entry
            .summary
            .as_ref()
            .map(|s| s.content.as_str())
            .unwrap_or("");

        let date = entry
            .published
            .or(entry.updated)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let url = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .map(|l| l.href.clone())
            .unwrap_or_else(|| entry.id.clone());

        Some(
            RecordBuilder::new("arxiv", arxiv_id)
                .title(title)
                .creators(entry.authors.iter().map(|a| a.name.as_str()))
                .description(summary)
                .datestamp(date)
                .url(url)
                .build(),
        )
    }

    async fn fetch_feed(&self, url: &str) -> Result<feed_rs::model::Feed, SourceError> {
        tracing::debug!(source = "arxiv", %url, "querying");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/atom+xml")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch arXiv results: {}", e)))?;
        let response = check_status(response, "arXiv").await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        parser::parse(bytes.as_ref())
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))
    }
}

/// Drop a trailing `vN` version suffix
fn strip_version(id: &str) -> &str {
    match id.rfind('v') {
        Some(pos)
            if pos > 0
                && pos + 1 < id.len()
                && id[pos + 1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            &id[..pos]
        }
        _ => id,
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    fn description(&self) -> &str {
        "arXiv preprint repository"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::AtomFeed
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        let search_query = format!("all:{}", query.query_or(DEFAULT_QUERY));
        let url = format!(
            "{}?search_query={}&start=0&max_results={}",
            self.base_url,
            urlencoding::encode(&search_query),
            query.limit
        );

        let feed = self.fetch_feed(&url).await?;

        Ok(feed
            .entries
            .iter()
            .filter_map(Self::parse_entry)
            .take(query.limit)
            .collect())
    }

    async fn fetch_by_id(&self, raw_id: &str) -> Result<Record, SourceError> {
        let arxiv_id = self.parse_id(raw_id);
        if arxiv_id.is_empty() {
            return Err(SourceError::InvalidRequest("Empty arXiv ID".to_string()));
        }

        let url = format!(
            "{}?id_list={}",
            self.base_url,
            urlencoding::encode(&arxiv_id)
        );

        let feed = self.fetch_feed(&url).await?;

        feed.entries
            .iter()
            .find_map(Self::parse_entry)
            .ok_or_else(|| SourceError::NotFound(format!("arXiv paper {}", arxiv_id)))
    }

    fn parse_id(&self, raw_id: &str) -> String {
        Self::parse_arxiv_id(raw_id)
    }
}
