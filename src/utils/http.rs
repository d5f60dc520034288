//! HTTP client utilities.

use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;

/// User agent sent with every outbound request; GitHub rejects requests without one
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_user_agent(USER_AGENT, timeout)
    }

    /// Create a client with a custom user agent
    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }
}

/// Attach an `Authorization` header only when a token is configured
pub fn with_auth(request: RequestBuilder, scheme: &str, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) if !token.trim().is_empty() => {
            request.header(reqwest::header::AUTHORIZATION, format!("{} {}", scheme, token.trim()))
        }
        _ => request,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new(Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_with_auth_skips_missing_token() {
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();

        let request = with_auth(client.get("http://example.com"), "Bearer", None)
            .build()
            .unwrap();
        assert!(request.headers().get("authorization").is_none());

        let request = with_auth(client.get("http://example.com"), "Bearer", Some("  "))
            .build()
            .unwrap();
        assert!(request.headers().get("authorization").is_none());

        let request = with_auth(client.get("http://example.com"), "token", Some("abc"))
            .build()
            .unwrap();
        assert_eq!(request.headers()["authorization"], "token abc");
    }
}
