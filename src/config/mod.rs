//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `OAI_BRIDGE_` (sections separated by `__`,
//! e.g. `OAI_BRIDGE_SERVER__PORT=8080`).
//!
//! A handful of well-known variables are honoured as defaults so existing
//! deployments keep working:
//!
//! - `ZENODO_TOKEN`, `GITHUB_TOKEN` - optional API tokens
//! - `OAI_PMH_BASE_URL` - base URL of the repository hosting the import endpoint
//! - `OAI_PMH_CLI` - path of the repository's import CLI
//! - `OAI_PMH_TEMP_DIR` - where the CLI sink writes XML files
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 5000
//! debug = false
//!
//! [sink]
//! mode = "http"                    # or "cli"
//! base_url = "http://localhost"
//! import_path = "/import-record.php"
//! timeout_secs = 60
//!
//! [sources]
//! timeout_secs = 30
//!
//! [api_keys]
//! zenodo = "..."
//! github = "..."
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix for layered overrides
pub const ENV_PREFIX: &str = "OAI_BRIDGE";

/// File name searched in the working directory
pub const CONFIG_FILE_NAME: &str = "oai-bridge.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Where imported records are delivered
    #[serde(default)]
    pub sink: SinkConfig,

    /// Upstream API endpoints and timeouts
    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Raises the default log level to debug
    #[serde(default)]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// How records reach the repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkMode {
    /// POST to the repository's import endpoint
    #[default]
    Http,
    /// Run the repository's import CLI locally
    Cli,
}

/// Sink settings for both delivery modes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub mode: SinkMode,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_import_path")]
    pub import_path: String,

    /// PHP interpreter used to run the import CLI
    #[serde(default = "default_php_binary")]
    pub php_binary: String,

    #[serde(default = "default_cli_path")]
    pub cli_path: PathBuf,

    /// Working directory for the import CLI (defaults to the current directory)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Per-record delivery timeout
    #[serde(default = "default_sink_timeout")]
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            mode: SinkMode::default(),
            base_url: default_base_url(),
            import_path: default_import_path(),
            php_binary: default_php_binary(),
            cli_path: default_cli_path(),
            working_dir: None,
            temp_dir: default_temp_dir(),
            timeout_secs: default_sink_timeout(),
        }
    }
}

impl SinkConfig {
    /// Full URL of the import endpoint
    pub fn import_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.import_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    env_value("OAI_PMH_BASE_URL").unwrap_or_else(|| "http://localhost".to_string())
}

fn default_import_path() -> String {
    "/import-record.php".to_string()
}

fn default_php_binary() -> String {
    "php".to_string()
}

fn default_cli_path() -> PathBuf {
    env_value("OAI_PMH_CLI")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("bin/cli"))
}

fn default_temp_dir() -> PathBuf {
    env_value("OAI_PMH_TEMP_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

fn default_sink_timeout() -> u64 {
    60
}

/// Upstream endpoints; overridable so tests and mirrors can point elsewhere
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Timeout for each outbound source request
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_zenodo_url")]
    pub zenodo_url: String,

    #[serde(default = "default_zenodo_sandbox_url")]
    pub zenodo_sandbox_url: String,

    #[serde(default = "default_github_url")]
    pub github_url: String,

    #[serde(default = "default_arxiv_url")]
    pub arxiv_url: String,

    #[serde(default = "default_jsonplaceholder_url")]
    pub jsonplaceholder_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_source_timeout(),
            zenodo_url: default_zenodo_url(),
            zenodo_sandbox_url: default_zenodo_sandbox_url(),
            github_url: default_github_url(),
            arxiv_url: default_arxiv_url(),
            jsonplaceholder_url: default_jsonplaceholder_url(),
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_source_timeout() -> u64 {
    30
}

fn default_zenodo_url() -> String {
    "https://zenodo.org/api".to_string()
}

fn default_zenodo_sandbox_url() -> String {
    "https://sandbox.zenodo.org/api".to_string()
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

fn default_arxiv_url() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_jsonplaceholder_url() -> String {
    "https://jsonplaceholder.typicode.com".to_string()
}

/// API tokens for sources that accept authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(default = "default_zenodo_token")]
    pub zenodo: Option<String>,

    #[serde(default = "default_github_token")]
    pub github: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            zenodo: default_zenodo_token(),
            github: default_github_token(),
        }
    }
}

impl ApiKeys {
    /// Copy with every configured token replaced by a placeholder
    pub fn redacted(&self) -> Self {
        let mask = |t: &Option<String>| t.as_ref().map(|_| "********".to_string());
        Self {
            zenodo: mask(&self.zenodo),
            github: mask(&self.github),
        }
    }
}

fn default_zenodo_token() -> Option<String> {
    env_value("ZENODO_TOKEN")
}

fn default_github_token() -> Option<String> {
    env_value("GITHUB_TOKEN")
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Render as TOML with tokens redacted
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        shown.api_keys = self.api_keys.redacted();
        toml::to_string_pretty(&shown)
    }
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config: Config = settings.try_deserialize()?;
    // empty strings from the environment mean "no token"
    config.api_keys.zenodo = config.api_keys.zenodo.filter(|t| !t.trim().is_empty());
    config.api_keys.github = config.api_keys.github.filter(|t| !t.trim().is_empty());
    Ok(config)
}

/// Look for a config file in the working directory, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("oai-bridge").join("config.toml"))
        .filter(|path| path.is_file())
}
