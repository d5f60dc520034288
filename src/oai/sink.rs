//! Delivery of serialized records to the OAI-PMH repository.
//!
//! Two deployments exist: the repository exposes an HTTP import endpoint
//! ([`HttpSink`]), or the bridge runs next to it and calls its console command
//! ([`CliSink`]). Both accept the same [`Submission`].

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{SinkConfig, SinkMode};
use crate::oai::dublin_core::METADATA_PREFIX;
use crate::utils::HttpClient;

/// One record ready for import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub identifier: String,
    pub metadata_prefix: String,
    /// Serialized `oai_dc` XML
    pub content: String,
}

impl Submission {
    pub fn oai_dc(identifier: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            metadata_prefix: METADATA_PREFIX.to_string(),
            content: content.into(),
        }
    }
}

/// Errors reported by a sink for a single submission
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The repository answered but refused the record; holds its response text
    #[error("{0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Import timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        SinkError::Transport(err.to_string())
    }
}

/// Destination accepting one submission at a time
#[async_trait]
pub trait Sink: Send + Sync + std::fmt::Debug {
    /// Short name shown by `/health`
    fn name(&self) -> &str;

    /// Deliver one record; `Ok` only when the repository reports success
    async fn deliver(&self, submission: &Submission) -> Result<(), SinkError>;
}

/// Added to the HTTP client timeout; the importer's per-record timeout fires first
const TRANSPORT_GRACE: Duration = Duration::from_secs(5);

/// Build the sink selected by configuration
pub fn from_config(config: &SinkConfig) -> Result<Arc<dyn Sink>, SinkError> {
    let sink: Arc<dyn Sink> = match config.mode {
        SinkMode::Http => {
            let client = HttpClient::new(config.timeout() + TRANSPORT_GRACE)?;
            Arc::new(HttpSink::new(client, config.import_url()))
        }
        SinkMode::Cli => Arc::new(CliSink::new(
            &config.php_binary,
            config.cli_path.clone(),
            config.working_dir.clone(),
            config.temp_dir.clone(),
        )),
    };
    Ok(sink)
}

/// Form-encoded POST to the repository's import endpoint
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: HttpClient,
    import_url: String,
}

impl HttpSink {
    pub fn new(client: HttpClient, import_url: impl Into<String>) -> Self {
        Self {
            client,
            import_url: import_url.into(),
        }
    }

    pub fn import_url(&self) -> &str {
        &self.import_url
    }
}

#[async_trait]
impl Sink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn deliver(&self, submission: &Submission) -> Result<(), SinkError> {
        tracing::debug!(identifier = %submission.identifier, url = %self.import_url, "posting record");

        let form = [
            ("identifier", submission.identifier.as_str()),
            ("metadataPrefix", submission.metadata_prefix.as_str()),
            ("content", submission.content.as_str()),
        ];
        let response = self.client.post(&self.import_url).form(&form).send().await?;

        // the import endpoint answers exactly 200 on success
        if response.status() == reqwest::StatusCode::OK {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if body.trim().is_empty() {
            Err(SinkError::Rejected(format!("HTTP {}", status)))
        } else {
            Err(SinkError::Rejected(body))
        }
    }
}

/// Runs `<php> <cli> oai:add:record <identifier> <prefix> <file> --no-interaction`
#[derive(Debug, Clone)]
pub struct CliSink {
    program: String,
    cli_path: PathBuf,
    working_dir: Option<PathBuf>,
    temp_dir: PathBuf,
}

impl CliSink {
    pub fn new(
        program: impl Into<String>,
        cli_path: PathBuf,
        working_dir: Option<PathBuf>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            program: program.into(),
            cli_path,
            working_dir,
            temp_dir,
        }
    }

    /// Write the XML to a fresh file under the temp dir; removed when dropped
    fn write_temp_file(&self, content: &str) -> Result<tempfile::NamedTempFile, SinkError> {
        std::fs::create_dir_all(&self.temp_dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("oai_record_")
            .suffix(".xml")
            .tempfile_in(&self.temp_dir)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

#[async_trait]
impl Sink for CliSink {
    fn name(&self) -> &str {
        "cli"
    }

    async fn deliver(&self, submission: &Submission) -> Result<(), SinkError> {
        let file = self.write_temp_file(&submission.content)?;

        let mut command = tokio::process::Command::new(&self.program);
        command
            .arg(&self.cli_path)
            .arg("oai:add:record")
            .arg(&submission.identifier)
            .arg(&submission.metadata_prefix)
            .arg(file.path())
            .arg("--no-interaction")
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        tracing::debug!(identifier = %submission.identifier, file = %file.path().display(), "running import command");
        let output = command.output().await?;
        drop(file);

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        if message.is_empty() {
            Err(SinkError::Rejected(format!("import command failed: {}", output.status)))
        } else {
            Err(SinkError::Rejected(message))
        }
    }
}
