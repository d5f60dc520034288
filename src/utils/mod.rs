//! Utility modules shared by sources and sinks.
//!
//! - [`HttpClient`]: reqwest client with a bounded timeout and the crate's user agent
//! - [`with_auth`]: attach an optional token as an `Authorization` header
//!
//! # HTTP Client
//!
//! ```rust,no_run
//! use oai_bridge::utils::{with_auth, HttpClient};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(Duration::from_secs(30))?;
//! let response = with_auth(client.get("https://zenodo.org/api/records"), "Bearer", None)
//!     .send()
//!     .await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod http;

pub use http::{with_auth, HttpClient, USER_AGENT};
