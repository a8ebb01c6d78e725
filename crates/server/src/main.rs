//! BoxOffice server binary.
//!
//! Launches the ticketing gRPC server with in-process stores.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (loopback, port 50051)
//! boxoffice-server
//!
//! # Start with explicit settings
//! boxoffice-server --listen 0.0.0.0:50051 --log-format json
//!
//! # Environment variables work too; CLI arguments override them
//! BOXOFFICE_LISTEN=0.0.0.0:50051 boxoffice-server
//! ```

use std::io::IsTerminal;
use std::sync::Arc;

use boxoffice_server::config::{Cli, Config, ConfigError, LogFormat};
use boxoffice_server::server::BoxOfficeServer;
use boxoffice_server::shutdown;
use boxoffice_store::{MemoryCatalog, MemoryCredentials, MemoryLedger};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Top-level error type for the server binary.
#[derive(Debug)]
enum ServerError {
    Config(ConfigError),
    Server(Box<dyn std::error::Error>),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "config error: {}", e),
            ServerError::Server(e) => write!(f, "server error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Parse CLI args and env vars (clap handles --help and --version)
    let cli = Cli::parse();
    let config = Config::load(&cli).map_err(ServerError::Config)?;

    init_logging(&config);

    tracing::info!(
        listen_addr = %config.listen_addr,
        "Starting BoxOffice server"
    );

    // The stores are process-wide shared resources; all data is lost on
    // shutdown.
    tracing::warn!(
        "Running with in-process stores. All users, concerts, and bookings \
         are lost on shutdown."
    );

    let credentials = Arc::new(MemoryCredentials::new());
    let catalog = Arc::new(MemoryCatalog::new());
    let ledger = Arc::new(MemoryLedger::new());

    // Wire the signal handler into the server's shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let shutdown_handle = tokio::spawn(async move {
        shutdown::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let server = BoxOfficeServer::builder()
        .credentials(credentials)
        .catalog(catalog)
        .ledger(ledger)
        .addr(config.listen_addr)
        .max_concurrent(config.max_concurrent)
        .shutdown_rx(Some(shutdown_rx))
        .build();

    tracing::info!("Server ready, accepting connections");
    let server_result = server.serve().await;
    shutdown_handle.abort();

    server_result.map_err(ServerError::Server)?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the logging system based on configuration.
///
/// Supports three formats:
/// - `Text`: Human-readable format (development)
/// - `Json`: JSON structured logging (production)
/// - `Auto`: JSON for non-TTY stdout, text otherwise
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = match config.log_format {
        LogFormat::Json => true,
        LogFormat::Text => false,
        LogFormat::Auto => !std::io::stdout().is_terminal(),
    };

    if use_json {
        // JSON format for production / log aggregation
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .init();
    } else {
        // Human-readable text format for development
        tracing_subscriber::registry().with(env_filter).with(fmt::layer()).init();
    }
}
