//! # OAI Bridge
//!
//! Pulls metadata records from external APIs (Zenodo, GitHub, arXiv and a demo
//! API), serializes them as Dublin Core and imports them into an OAI-PMH
//! repository.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Record, ImportResult, SearchQuery)
//! - [`sources`]: Source adapters behind the [`Source`] trait
//! - [`oai`]: Dublin Core serialization, sinks and the batch importer
//! - [`bridge`]: Sync orchestration shared by the server and the CLI
//! - [`server`]: axum HTTP front end
//! - [`utils`]: HTTP client helpers
//! - [`config`]: Configuration management

pub mod bridge;
pub mod config;
pub mod models;
pub mod oai;
pub mod server;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use bridge::{Bridge, BridgeError, SyncReport};
pub use models::Record;
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
