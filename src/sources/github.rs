//! GitHub repository source.
//!
//! Repositories are searched through the REST search API and fetched individually
//! by `owner/repo`. API documentation: <https://docs.github.com/en/rest>

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{Record, RecordBuilder, SearchQuery, NO_DESCRIPTION};
use crate::sources::{check_status, path_segments, Source, SourceError};
use crate::utils::{with_auth, HttpClient};

const DEFAULT_QUERY: &str = "machine learning";

/// GitHub repositories as records: owner is the creator, creation date the datestamp
#[derive(Debug, Clone)]
pub struct GithubSource {
    client: Arc<HttpClient>,
    base_url: String,
    token: Option<String>,
}

impl GithubSource {
    pub fn new(client: Arc<HttpClient>, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token,
        }
    }

    /// Reduce a repository URL to `owner/repo`
    ///
    /// Handles formats like:
    /// - "torvalds/linux"
    /// - "https://github.com/torvalds/linux"
    /// - "github.com/torvalds/linux.git"
    /// - "https://github.com/torvalds/linux/tree/master?tab=readme"
    pub fn parse_repo_path(raw: &str) -> String {
        let raw = raw.trim();

        if raw.contains("github.com/") {
            let segments = path_segments(raw);
            if let [owner, repo, ..] = segments.as_slice() {
                let repo = repo.strip_suffix(".git").unwrap_or(repo);
                return format!("{}/{}", owner, repo);
            }
        }

        raw.trim_matches('/').to_string()
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        with_auth(self.client.get(url), "token", self.token.as_deref())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    fn parse_repo(repo: GithubRepo) -> Record {
        RecordBuilder::new("github:repo", repo.id.to_string())
            .title(repo.full_name.unwrap_or_default())
            .creator(repo.owner.map(|o| o.login).unwrap_or_default())
            .description(repo.description.unwrap_or_default())
            .description_fallback(NO_DESCRIPTION)
            .datestamp(repo.created_at.unwrap_or_default())
            .url(repo.html_url.unwrap_or_default())
            .build()
    }
}

#[async_trait]
impl Source for GithubSource {
    fn id(&self) -> &str {
        "github"
    }

    fn name(&self) -> &str {
        "GitHub"
    }

    fn description(&self) -> &str {
        "GitHub repositories"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        let url = format!(
            "{}/search/repositories?q={}&sort=stars&per_page={}",
            self.base_url,
            urlencoding::encode(query.query_or(DEFAULT_QUERY)),
            query.limit
        );
        tracing::debug!(source = "github", %url, "searching");

        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search GitHub: {}", e)))?;
        let response = check_status(response, "GitHub").await?;

        let json: GithubSearchResponse = response.json().await.map_err(|e| {
            SourceError::Parse(format!("Failed to parse GitHub response: {}", e))
        })?;

        Ok(json
            .items
            .into_iter()
            .take(query.limit)
            .map(Self::parse_repo)
            .collect())
    }

    async fn fetch_by_id(&self, raw_id: &str) -> Result<Record, SourceError> {
        let repo_path = self.parse_id(raw_id);
        let Some((owner, repo)) = repo_path.split_once('/') else {
            return Err(SourceError::InvalidRequest(format!(
                "Expected owner/repo, got '{}'",
                repo_path
            )));
        };

        let url = format!(
            "{}/repos/{}/{}",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        tracing::debug!(source = "github", %url, "fetching repository");

        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch from GitHub: {}", e)))?;
        let response = check_status(response, "GitHub").await?;

        let repo: GithubRepo = response.json().await.map_err(|e| {
            SourceError::Parse(format!("Failed to parse GitHub repository: {}", e))
        })?;

        Ok(Self::parse_repo(repo))
    }

    fn parse_id(&self, raw_id: &str) -> String {
        Self::parse_repo_path(raw_id)
    }
}

#[derive(Debug, Deserialize)]
struct GithubSearchResponse {
    #[serde(default)]
    items: Vec<GithubRepo>,
}

#[derive(Debug, Deserialize)]
struct GithubRepo {
    id: u64,
    full_name: Option<String>,
    owner: Option<GithubOwner>,
    description: Option<String>,
    created_at: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubOwner {
    login: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn source(base_url: &str, token: Option<&str>) -> GithubSource {
        let client = Arc::new(HttpClient::new(Duration::from_secs(5)).unwrap());
        GithubSource::new(client, base_url, token.map(str::to_string))
    }

    const LINUX: &str = r#"{
        "id": 2325298,
        "full_name": "torvalds/linux",
        "owner": {"login": "torvalds"},
        "description": "Linux kernel source tree",
        "created_at": "2011-09-04T22:48:12Z",
        "html_url": "https://github.com/torvalds/linux",
        "stargazers_count": 180000
    }"#;

    #[test]
    fn test_parse_repo_path() {
        assert_eq!(GithubSource::parse_repo_path("torvalds/linux"), "torvalds/linux");
        assert_eq!(
            GithubSource::parse_repo_path(" https://github.com/torvalds/linux "),
            "torvalds/linux"
        );
        assert_eq!(
            GithubSource::parse_repo_path("github.com/torvalds/linux.git"),
            "torvalds/linux"
        );
        assert_eq!(
            GithubSource::parse_repo_path("https://github.com/torvalds/linux/tree/master?tab=readme"),
            "torvalds/linux"
        );
    }

    #[tokio::test]
    async fn test_fetch_by_repo_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/torvalds/linux")
            .match_header("authorization", "token gh-secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LINUX)
            .create_async()
            .await;

        let github = source(&server.url(), Some("gh-secret"));
        let record = github.fetch_by_id("torvalds/linux").await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.identifier, "github:repo:2325298");
        assert_eq!(record.creator, "torvalds");
        assert_eq!(record.title, "torvalds/linux");
        assert_eq!(record.datestamp, "2011-09-04");
        assert_eq!(record.description, "Linux kernel source tree");
        assert_eq!(record.url.as_deref(), Some("https://github.com/torvalds/linux"));
        assert!(record.doi.is_none());
    }

    #[tokio::test]
    async fn test_fetch_by_url_matches_bare_path() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/torvalds/linux")
            .expect(2)
            .with_status(200)
            .with_body(LINUX)
            .create_async()
            .await;

        let github = source(&server.url(), None);
        let from_path = github.fetch_by_id("torvalds/linux").await.unwrap();
        let from_url = github
            .fetch_by_id("https://github.com/torvalds/linux")
            .await
            .unwrap();
        assert_eq!(from_path.identifier, from_url.identifier);
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_path() {
        let github = source("http://127.0.0.1:1", None);
        let err = github.fetch_by_id("linux").await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_search_null_description() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "rust".into()),
                Matcher::UrlEncoded("sort".into(), "stars".into()),
                Matcher::UrlEncoded("per_page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"total_count": 1, "items": [
                    {"id": 7, "full_name": "a/b", "owner": {"login": "a"},
                     "description": null, "created_at": "2020-01-01T00:00:00Z",
                     "html_url": "https://github.com/a/b"}
                ]}"#,
            )
            .create_async()
            .await;

        let github = source(&server.url(), None);
        let records = github
            .search(&SearchQuery::new("rust").limit(1))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "github:repo:7");
        assert_eq!(records[0].description, NO_DESCRIPTION);
    }
}
