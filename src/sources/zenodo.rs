//! Zenodo research source implementation.
//!
//! Uses the Zenodo records API for searching and retrieving records.
//! API documentation: <https://developers.zenodo.org>

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{Record, RecordBuilder, SearchQuery, DEFAULT_CREATOR, NO_DESCRIPTION};
use crate::sources::{check_status, path_segments, Source, SourceError};
use crate::utils::{with_auth, HttpClient};

/// Query used when the caller leaves the search blank
const DEFAULT_QUERY: &str = "open science";

/// DOI prefix Zenodo mints for its records
const ZENODO_DOI_PREFIX: &str = "10.5281/zenodo.";

/// Zenodo research source
///
/// The same adapter serves the production instance and the sandbox; only the id and
/// base URL differ. A token is optional and sent as a bearer token.
#[derive(Debug, Clone)]
pub struct ZenodoSource {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    client: Arc<HttpClient>,
    base_url: String,
    token: Option<String>,
}

impl ZenodoSource {
    /// Production Zenodo, e.g. `https://zenodo.org/api`
    pub fn new(client: Arc<HttpClient>, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            id: "zenodo",
            name: "Zenodo",
            description: "Zenodo research repository",
            client,
            base_url: base_url.into(),
            token,
        }
    }

    /// Zenodo sandbox, e.g. `https://sandbox.zenodo.org/api`
    pub fn sandbox(
        client: Arc<HttpClient>,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            id: "zenodo_sandbox",
            name: "Zenodo Sandbox",
            description: "Zenodo sandbox for testing",
            ..Self::new(client, base_url, token)
        }
    }

    /// Extract the numeric record id from a bare id, a Zenodo DOI or a record URL
    ///
    /// Handles formats like:
    /// - "8186638"
    /// - "zenodo:8186638"
    /// - "10.5281/zenodo.8186638" (also inside a doi.org URL)
    /// - "https://zenodo.org/records/8186638"
    pub fn parse_record_id(raw: &str) -> String {
        let raw = raw.trim();

        if let Some(pos) = raw.find(ZENODO_DOI_PREFIX) {
            let digits: String = raw[pos + ZENODO_DOI_PREFIX.len()..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if !digits.is_empty() {
                return digits;
            }
        }

        if raw.contains("zenodo.org") {
            if let Some(last) = path_segments(raw).pop() {
                return last;
            }
        }

        raw.strip_prefix("zenodo:").unwrap_or(raw).to_string()
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        with_auth(self.client.get(url), "Bearer", self.token.as_deref())
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn parse_hit(&self, hit: ZenodoHit) -> Record {
        // unnamed creators keep their place in the list
        let creators = hit.metadata.creators.into_iter().map(|c| {
            c.name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CREATOR.to_string())
        });
        let doi = hit.doi.or(hit.metadata.doi).unwrap_or_default();
        let url = hit.links.self_html.or(hit.links.html).unwrap_or_default();

        RecordBuilder::new(self.id, hit.id.to_string())
            .title(hit.metadata.title.unwrap_or_default())
            .creators(creators)
            .description(hit.metadata.description.unwrap_or_default())
            .description_fallback(NO_DESCRIPTION)
            .datestamp(hit.metadata.publication_date.unwrap_or_default())
            .doi(doi)
            .url(url)
            .build()
    }
}

#[async_trait]
impl Source for ZenodoSource {
    fn id(&self) -> &str {
        self.id
    }

    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        let url = format!(
            "{}/records?q={}&size={}&sort=mostrecent",
            self.base_url,
            urlencoding::encode(query.query_or(DEFAULT_QUERY)),
            query.limit
        );
        tracing::debug!(source = self.id, %url, "searching");

        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search {}: {}", self.name, e)))?;
        let response = check_status(response, self.name).await?;

        let json: ZenodoResponse = response.json().await.map_err(|e| {
            SourceError::Parse(format!("Failed to parse {} response: {}", self.name, e))
        })?;

        Ok(json
            .hits
            .hits
            .into_iter()
            .take(query.limit)
            .map(|hit| self.parse_hit(hit))
            .collect())
    }

    async fn fetch_by_id(&self, raw_id: &str) -> Result<Record, SourceError> {
        let record_id = self.parse_id(raw_id);
        if record_id.is_empty() {
            return Err(SourceError::InvalidRequest("Empty Zenodo id".to_string()));
        }

        let url = format!(
            "{}/records/{}",
            self.base_url,
            urlencoding::encode(&record_id)
        );
        tracing::debug!(source = self.id, %url, "fetching record");

        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch from {}: {}", self.name, e)))?;
        let response = check_status(response, self.name).await?;

        let hit: ZenodoHit = response.json().await.map_err(|e| {
            SourceError::Parse(format!("Failed to parse {} record: {}", self.name, e))
        })?;

        Ok(self.parse_hit(hit))
    }

    fn parse_id(&self, raw_id: &str) -> String {
        Self::parse_record_id(raw_id)
    }
}

/// Zenodo API response
#[derive(Debug, Deserialize)]
struct ZenodoResponse {
    #[serde(default)]
    hits: ZenodoHits,
}

#[derive(Debug, Default, Deserialize)]
struct ZenodoHits {
    #[serde(default)]
    hits: Vec<ZenodoHit>,
}

#[derive(Debug, Deserialize)]
struct ZenodoHit {
    id: NativeId,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    metadata: ZenodoMetadata,
    #[serde(default)]
    links: ZenodoLinks,
}

/// Record ids are numbers in current responses and strings in some older ones
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NativeId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for NativeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeId::Number(n) => write!(f, "{}", n),
            NativeId::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ZenodoMetadata {
    title: Option<String>,
    description: Option<String>,
    doi: Option<String>,
    publication_date: Option<String>,
    #[serde(default)]
    creators: Vec<ZenodoCreator>,
}

#[derive(Debug, Deserialize)]
struct ZenodoCreator {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ZenodoLinks {
    self_html: Option<String>,
    html: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DESCRIPTION_LIMIT;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn source(base_url: &str, token: Option<&str>) -> ZenodoSource {
        let client = Arc::new(HttpClient::new(Duration::from_secs(5)).unwrap());
        ZenodoSource::new(client, base_url, token.map(str::to_string))
    }

    #[test]
    fn test_parse_record_id() {
        assert_eq!(ZenodoSource::parse_record_id("8186638"), "8186638");
        assert_eq!(ZenodoSource::parse_record_id("  8186638 \n"), "8186638");
        assert_eq!(ZenodoSource::parse_record_id("zenodo:8186638"), "8186638");
        assert_eq!(
            ZenodoSource::parse_record_id("10.5281/zenodo.8186638"),
            "8186638"
        );
        assert_eq!(
            ZenodoSource::parse_record_id("https://doi.org/10.5281/zenodo.8186638"),
            "8186638"
        );
        assert_eq!(
            ZenodoSource::parse_record_id("https://zenodo.org/records/8186638"),
            "8186638"
        );
        assert_eq!(
            ZenodoSource::parse_record_id("https://zenodo.org/record/8186638/?x=1"),
            "8186638"
        );
    }

    #[test]
    fn test_doi_and_url_forms_agree() {
        assert_eq!(
            ZenodoSource::parse_record_id("10.5281/zenodo.8186638"),
            ZenodoSource::parse_record_id("https://zenodo.org/records/8186638")
        );
    }

    #[tokio::test]
    async fn test_search_maps_hits() {
        let mut server = Server::new_async().await;
        let long_description = "d".repeat(DESCRIPTION_LIMIT + 20);
        let body = serde_json::json!({
            "hits": {
                "total": 2,
                "hits": [
                    {
                        "id": 8186638,
                        "doi": "10.5281/zenodo.8186638",
                        "metadata": {
                            "title": "COVID-19 dataset",
                            "description": long_description,
                            "publication_date": "2023-07-26",
                            "creators": [{"name": "Doe, Jane"}, {"name": "Roe, Richard"}]
                        },
                        "links": {"self_html": "https://zenodo.org/records/8186638"}
                    },
                    {
                        "id": 42,
                        "metadata": {},
                        "links": {}
                    }
                ]
            }
        });

        let mock = server
            .mock("GET", "/api/records")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "covid".into()),
                Matcher::UrlEncoded("size".into(), "2".into()),
                Matcher::UrlEncoded("sort".into(), "mostrecent".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let zenodo = source(&format!("{}/api", server.url()), None);
        let records = zenodo
            .search(&SearchQuery::new("covid").limit(2))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.identifier, "zenodo:8186638");
        assert_eq!(first.title, "COVID-19 dataset");
        assert_eq!(first.creator, "Doe, Jane; Roe, Richard");
        assert_eq!(first.datestamp, "2023-07-26");
        assert_eq!(first.doi.as_deref(), Some("10.5281/zenodo.8186638"));
        assert_eq!(first.url.as_deref(), Some("https://zenodo.org/records/8186638"));
        assert_eq!(first.description.chars().count(), DESCRIPTION_LIMIT + 3);

        let second = &records[1];
        assert_eq!(second.identifier, "zenodo:42");
        assert_eq!(second.title, "Untitled");
        assert_eq!(second.creator, DEFAULT_CREATOR);
        assert_eq!(second.description, NO_DESCRIPTION);
        assert!(second.doi.is_none());
        assert!(second.url.is_none());
    }

    #[tokio::test]
    async fn test_search_uses_default_query_and_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/records")
            .match_query(Matcher::UrlEncoded("q".into(), DEFAULT_QUERY.into()))
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"hits": {"hits": []}}"#)
            .create_async()
            .await;

        let zenodo = source(&format!("{}/api", server.url()), Some("secret"));
        let records = zenodo.search(&SearchQuery::new("")).await.unwrap();

        mock.assert_async().await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/records")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let zenodo = source(&format!("{}/api", server.url()), None);
        let err = zenodo.search(&SearchQuery::new("x")).await.unwrap_err();
        assert!(matches!(err, SourceError::Api(_)));
    }

    #[tokio::test]
    async fn test_fetch_by_doi() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/records/8186638")
            .with_status(200)
            .with_body(
                r#"{"id": 8186638, "doi": "10.5281/zenodo.8186638",
                    "metadata": {"title": "A record", "creators": [{"name": "Doe, Jane"}]},
                    "links": {"html": "https://zenodo.org/records/8186638"}}"#,
            )
            .create_async()
            .await;

        let zenodo = source(&format!("{}/api", server.url()), None);
        let record = zenodo.fetch_by_id("10.5281/zenodo.8186638").await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.identifier, "zenodo:8186638");
        assert_eq!(record.title, "A record");
        assert_eq!(record.url.as_deref(), Some("https://zenodo.org/records/8186638"));
    }

    #[tokio::test]
    async fn test_unnamed_creator_becomes_unknown() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/records/7")
            .with_status(200)
            .with_body(
                r#"{"id": 7, "metadata": {"title": "T",
                    "creators": [{"name": "Doe, Jane"}, {"affiliation": "CERN"}, {"name": "Roe, R"}]},
                    "links": {}}"#,
            )
            .create_async()
            .await;

        let zenodo = source(&format!("{}/api", server.url()), None);
        let record = zenodo.fetch_by_id("7").await.unwrap();
        assert_eq!(record.creator, "Doe, Jane; Unknown; Roe, R");
    }

    #[tokio::test]
    async fn test_fetch_missing_record() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/records/1")
            .with_status(404)
            .create_async()
            .await;

        let zenodo = source(&format!("{}/api", server.url()), None);
        let err = zenodo.fetch_by_id("1").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn test_sandbox_identity() {
        let client = Arc::new(HttpClient::new(Duration::from_secs(5)).unwrap());
        let sandbox = ZenodoSource::sandbox(client, "https://sandbox.zenodo.org/api", None);
        assert_eq!(sandbox.id(), "zenodo_sandbox");
        assert_eq!(sandbox.name(), "Zenodo Sandbox");
    }
}
