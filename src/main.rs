use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oai_bridge::config::{find_config_file, load_config, Config, SinkMode};
use oai_bridge::models::{SearchQuery, DEFAULT_LIMIT};
use oai_bridge::oai::{sink_from_config, Importer};
use oai_bridge::server::{shutdown_signal, BridgeServer, HealthInfo};
use oai_bridge::{Bridge, BridgeError, SourceRegistry, SyncReport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// OAI Bridge - Import records from research APIs into an OAI-PMH repository
#[derive(Parser, Debug)]
#[command(name = "oai-bridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Import records from research APIs into an OAI-PMH repository", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Address to listen on (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Search a source and import every hit
    #[command(alias = "s")]
    Sync {
        /// Source id (see `sources`)
        source: String,

        /// Maximum number of records (1-100)
        #[arg(long, short, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Search query; blank uses the source's default
        #[arg(long, default_value = "")]
        query: String,
    },

    /// Fetch one record by id, DOI or URL and import it
    #[command(alias = "f")]
    Fetch {
        /// Source id (see `sources`)
        source: String,

        /// Record id, DOI or URL
        id: String,
    },

    /// List available sources
    #[command(alias = "ls")]
    Sources,

    /// Print the effective configuration (tokens redacted)
    Config,
}

fn print_env_vars() {
    println!("OAI Bridge - Environment Variables");
    println!();
    println!("API Keys:");
    println!("  ZENODO_TOKEN                Zenodo access token (sent as a bearer token)");
    println!("  GITHUB_TOKEN                GitHub token (raises the search rate limit)");
    println!();
    println!("Repository:");
    println!("  OAI_PMH_BASE_URL            Base URL of the repository's import endpoint (default: http://localhost)");
    println!("  OAI_PMH_CLI                 Path of the repository's import CLI (default: bin/cli)");
    println!("  OAI_PMH_TEMP_DIR            Directory for XML files handed to the CLI (default: system temp dir)");
    println!();
    println!("Layered Overrides (section__key):");
    println!("  OAI_BRIDGE_SERVER__HOST          Listen address (default: 0.0.0.0)");
    println!("  OAI_BRIDGE_SERVER__PORT          Listen port (default: 5000)");
    println!("  OAI_BRIDGE_SERVER__DEBUG         Debug logging (default: false)");
    println!("  OAI_BRIDGE_SINK__MODE            http or cli (default: http)");
    println!("  OAI_BRIDGE_SINK__IMPORT_PATH     Import endpoint path (default: /import-record.php)");
    println!("  OAI_BRIDGE_SINK__PHP_BINARY      PHP interpreter for the CLI sink (default: php)");
    println!("  OAI_BRIDGE_SINK__WORKING_DIR     Working directory for the CLI sink");
    println!("  OAI_BRIDGE_SINK__TIMEOUT_SECS    Per-record import timeout (default: 60)");
    println!("  OAI_BRIDGE_SOURCES__TIMEOUT_SECS Per-request source timeout (default: 30)");
    println!();
    println!("Logging:");
    println!("  RUST_LOG                    Log filter, overrides -v/-q (e.g. oai_bridge=debug)");
}

fn init_tracing(verbose: u8, quiet: bool, debug: bool) {
    let log_level = match (verbose, debug) {
        (0, false) => "info",
        (0, true) | (1, _) => "debug",
        _ => "trace",
    };

    let env_filter = if quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("oai_bridge={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wire the registry, sink and importer described by `config`
fn build_bridge(config: &Config) -> Result<Bridge> {
    let registry = SourceRegistry::from_config(config).context("Failed to create sources")?;
    let sink = sink_from_config(&config.sink).context("Failed to create sink")?;

    match config.sink.mode {
        SinkMode::Http => tracing::debug!(url = %config.sink.import_url(), "using HTTP sink"),
        SinkMode::Cli => {
            tracing::debug!(cli = %config.sink.cli_path.display(), "using CLI sink")
        }
    }

    let importer = Importer::new(sink, config.sink.timeout());
    Ok(Bridge::new(Arc::new(registry), importer))
}

/// Print the same JSON body the HTTP API would return
fn print_outcome(outcome: std::result::Result<SyncReport, BridgeError>) -> Result<()> {
    match outcome {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.body())?);
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
        return Ok(());
    }

    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config".to_string(),
    })?;

    init_tracing(cli.verbose, cli.quiet, config.server.debug);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });

    match command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let bridge = build_bridge(&config)?;
            let server = BridgeServer::new(bridge, HealthInfo::from_sink_config(&config.sink));
            server
                .run(&config.server.bind_addr(), shutdown_signal())
                .await?;
        }

        Commands::Sync {
            source,
            limit,
            query,
        } => {
            let bridge = build_bridge(&config)?;
            let query = SearchQuery::new(query).limit(limit);
            print_outcome(bridge.sync(&source, &query).await)?;
        }

        Commands::Fetch { source, id } => {
            let bridge = build_bridge(&config)?;
            print_outcome(bridge.sync_specific(&source, &id).await)?;
        }

        Commands::Sources => {
            let registry = SourceRegistry::from_config(&config)?;
            println!("{:<16} {:<10} {:<18} DESCRIPTION", "ID", "TYPE", "NAME");
            for source in registry.all() {
                println!(
                    "{:<16} {:<10} {:<18} {}",
                    source.id(),
                    source.kind().as_str(),
                    source.name(),
                    source.description()
                );
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
