//! HTTP front end built on axum.
//!
//! Routes:
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /` | operator page |
//! | `GET /health` | liveness plus sink settings |
//! | `GET /api/sources` | registered sources |
//! | `GET /sync/{source}?limit=&q=` | search and import |
//! | `GET /sync/specific/{source}?id=` | fetch one record and import it |
//!
//! Every sync runs on its own task so a panic inside it becomes a 500 response
//! instead of a dropped connection.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};

use crate::bridge::{Bridge, BridgeError, SyncReport};
use crate::config::SinkConfig;
use crate::models::{parse_limit, SearchQuery};
use crate::sources::SourceKind;

const INDEX_HTML: &str = include_str!("index.html");

/// Errors starting the HTTP server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sink settings reported by `/health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthInfo {
    pub cli_path: String,
    pub temp_dir: String,
}

impl HealthInfo {
    pub fn from_sink_config(config: &SinkConfig) -> Self {
        Self {
            cli_path: config.cli_path.display().to_string(),
            temp_dir: config.temp_dir.display().to_string(),
        }
    }
}

/// State shared by every handler
#[derive(Debug)]
pub struct AppState {
    pub bridge: Bridge,
    pub health: HealthInfo,
}

/// The bridge's HTTP server
#[derive(Debug, Clone)]
pub struct BridgeServer {
    state: Arc<AppState>,
}

impl BridgeServer {
    pub fn new(bridge: Bridge, health: HealthInfo) -> Self {
        Self {
            state: Arc::new(AppState { bridge, health }),
        }
    }

    /// The router, for embedding or for driving in tests
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind `addr` and serve in the background
    ///
    /// Returns the bound address (useful with port 0) and the server task.
    pub async fn start(&self, addr: &str) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
        let listener = self.bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let app = self.router();

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "server stopped");
            }
        });

        Ok((local_addr, handle))
    }

    /// Bind `addr` and serve until `shutdown` resolves
    pub async fn run<F>(&self, addr: &str, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind(addr).await?;
        tracing::info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }

    async fn bind(&self, addr: &str) -> Result<TcpListener, ServerError> {
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })
    }
}

/// Build the router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/sources", get(list_sources))
        .route("/sync/{source}", get(sync))
        .route("/sync/specific/{source}", get(sync_specific))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "cli_path": state.health.cli_path,
        "temp_dir": state.health.temp_dir,
        "sink": state.bridge.importer().sink().name(),
    }))
}

#[derive(Debug, Serialize)]
struct SourceInfo {
    name: String,
    description: String,
    #[serde(rename = "type")]
    kind: SourceKind,
}

async fn list_sources(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sources: Vec<SourceInfo> = state
        .bridge
        .registry()
        .all()
        .into_iter()
        .map(|source| SourceInfo {
            name: source.id().to_string(),
            description: source.description().to_string(),
            kind: source.kind(),
        })
        .collect();

    Json(serde_json::json!({ "sources": sources }))
}

// `limit` goes through `parse_limit`, so junk values mean the default
async fn sync(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let limit = parse_limit(params.get("limit").map(String::as_str));
    let query = SearchQuery::new(params.get("q").cloned().unwrap_or_default()).limit(limit);

    let bridge = state.bridge.clone();
    let source_id = source.clone();
    let outcome = tokio::spawn(async move { bridge.sync(&source_id, &query).await }).await;

    respond(&source, outcome)
}

async fn sync_specific(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let raw_id = params.get("id").cloned().unwrap_or_default();

    let bridge = state.bridge.clone();
    let source_id = source.clone();
    let outcome =
        tokio::spawn(async move { bridge.sync_specific(&source_id, &raw_id).await }).await;

    respond(&source, outcome)
}

fn respond(source: &str, outcome: Result<Result<SyncReport, BridgeError>, JoinError>) -> Response {
    let error = match outcome {
        Ok(Ok(report)) => return (StatusCode::OK, Json(report)).into_response(),
        Ok(Err(error)) => error,
        Err(join_error) => {
            let message = panic_message(join_error);
            tracing::error!(source, %message, "sync aborted");
            BridgeError::Internal {
                source_id: source.to_string(),
                message,
            }
        }
    };

    tracing::debug!(source, error = %error, "sync rejected");
    (error.status_code(), Json(error.body())).into_response()
}

fn panic_message(error: JoinError) -> String {
    if !error.is_panic() {
        return "Sync task was cancelled".to_string();
    }

    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("Internal error: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("Internal error: {}", message)
    } else {
        "Internal error".to_string()
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
