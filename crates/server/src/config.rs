//! Server configuration.
//!
//! CLI arguments (clap, with env var fallbacks) merged over an optional TOML
//! config file. Defaults work with zero configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

/// Command-line interface for the BoxOffice server.
#[derive(Debug, Parser)]
#[command(name = "boxoffice-server", version, about = "BoxOffice ticketing gRPC server")]
pub struct Cli {
    /// Address to listen on for gRPC.
    #[arg(long, env = "BOXOFFICE_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Path to a TOML config file.
    #[arg(long, env = "BOXOFFICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, env = "BOXOFFICE_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Max concurrent requests per connection.
    #[arg(long, env = "BOXOFFICE_MAX_CONCURRENT")]
    pub max_concurrent: Option<usize>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format (development).
    Text,
    /// JSON structured logging (production).
    Json,
    /// JSON for non-TTY stdout, text otherwise.
    Auto,
}

/// Resolved server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to listen on for gRPC.
    pub listen_addr: SocketAddr,
    /// Log output format.
    pub log_format: LogFormat,
    /// Max concurrent requests per connection.
    pub max_concurrent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            log_format: LogFormat::Auto,
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    // Loopback by default; operators opt in to remote exposure explicitly.
    SocketAddr::from(([127, 0, 0, 1], 50051))
}

fn default_max_concurrent() -> usize {
    100
}

impl Config {
    /// Loads configuration: file values (if a file is given), then CLI/env
    /// overrides on top.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                toml::from_str(&raw).map_err(|e| ConfigError::Parse {
                    path: path.clone(),
                    message: e.to_string(),
                })?
            }
            None => Self::default(),
        };

        if let Some(listen) = cli.listen {
            config.listen_addr = listen;
        }
        if let Some(format) = cli.log_format {
            config.log_format = format;
        }
        if let Some(max_concurrent) = cli.max_concurrent {
            config.max_concurrent = max_concurrent;
        }

        Ok(config)
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Failed to parse the config file.
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying parse error text.
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, message } => {
                write!(f, "failed to read config {}: {}", path.display(), message)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "failed to parse config {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cli() -> Cli {
        Cli {
            listen: None,
            config: None,
            log_format: None,
            max_concurrent: None,
        }
    }

    #[test]
    fn defaults_need_no_configuration() {
        let config = Config::load(&empty_cli()).unwrap();
        assert_eq!(config.listen_addr.port(), 50051);
        assert!(config.listen_addr.ip().is_loopback());
        assert_eq!(config.max_concurrent, 100);
        assert_eq!(config.log_format, LogFormat::Auto);
    }

    #[test]
    fn cli_overrides_defaults() {
        let mut cli = empty_cli();
        cli.listen = Some("0.0.0.0:9000".parse().unwrap());
        cli.max_concurrent = Some(8);

        let config = Config::load(&cli).unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.max_concurrent, 8);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("log_format = \"json\"").unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.listen_addr.port(), 50051);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let mut cli = empty_cli();
        cli.config = Some(PathBuf::from("/nonexistent/boxoffice.toml"));
        assert!(Config::load(&cli).is_err());
    }
}
