//! JSONPlaceholder demo source.
//!
//! Serves the fake `/posts` collection; useful for exercising the import path
//! without credentials or rate limits. The search query is ignored.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{Record, RecordBuilder, SearchQuery};
use crate::sources::{check_status, Source, SourceError};
use crate::utils::HttpClient;

#[derive(Debug, Clone)]
pub struct JsonPlaceholderSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl JsonPlaceholderSource {
    pub fn new(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Trailing numeric post id of `7`, `jsonplaceholder:post:7` or `.../posts/7`
    pub fn parse_post_id(raw: &str) -> String {
        let raw = raw.trim().trim_end_matches('/');
        let digits_start = raw
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(idx, _)| idx);

        match digits_start {
            Some(idx) => raw[idx..].to_string(),
            None => raw.to_string(),
        }
    }

    // Posts carry no date; the builder stamps them with today's date.
    fn parse_post(post: Post) -> Record {
        RecordBuilder::new("jsonplaceholder:post", post.id.to_string())
            .title(post.title)
            .creator(format!("User {}", post.user_id))
            .description(post.body)
            .build()
    }
}

#[async_trait]
impl Source for JsonPlaceholderSource {
    fn id(&self) -> &str {
        "jsonplaceholder"
    }

    fn name(&self) -> &str {
        "JSONPlaceholder"
    }

    fn description(&self) -> &str {
        "JSONPlaceholder demo API"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        let url = format!("{}/posts", self.base_url);
        tracing::debug!(source = "jsonplaceholder", %url, "listing posts");

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, "JSONPlaceholder").await?;
        let posts: Vec<Post> = response.json().await.map_err(|e| {
            SourceError::Parse(format!("Failed to parse JSONPlaceholder posts: {}", e))
        })?;

        Ok(posts
            .into_iter()
            .take(query.limit)
            .map(Self::parse_post)
            .collect())
    }

    async fn fetch_by_id(&self, raw_id: &str) -> Result<Record, SourceError> {
        let post_id = self.parse_id(raw_id);
        if post_id.is_empty() || !post_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(SourceError::InvalidRequest(format!(
                "Post id must be numeric, got '{}'",
                raw_id.trim()
            )));
        }

        let url = format!("{}/posts/{}", self.base_url, post_id);
        tracing::debug!(source = "jsonplaceholder", %url, "fetching post");

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, "JSONPlaceholder").await?;
        let post: Post = response.json().await.map_err(|e| {
            SourceError::Parse(format!("Failed to parse JSONPlaceholder post: {}", e))
        })?;

        Ok(Self::parse_post(post))
    }

    fn parse_id(&self, raw_id: &str) -> String {
        Self::parse_post_id(raw_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Post {
    id: u64,
    #[serde(default)]
    user_id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}
