//! Command-line interface for the Trees Against Humanity server.
//!
//! Every option except `--config` overrides a value from the configuration
//! file.

use clap::Parser;
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Realtime backend for Trees Against Humanity",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long = "config", value_name = "FILE", default_value = "config.toml")]
    pub config_path: PathBuf,

    /// Bind address (e.g., 127.0.0.1:8000)
    #[arg(short, long = "bind", value_name = "ADDRESS")]
    pub bind_address: Option<String>,

    /// Directory holding the source deck JSON files
    #[arg(short, long = "decks", value_name = "DIR")]
    pub decks_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    /// Maximum number of concurrent connections
    #[arg(long, value_name = "COUNT")]
    pub max_connections: Option<usize>,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config.toml"),
            bind_address: None,
            decks_dir: None,
            log_level: None,
            json_logs: false,
            max_connections: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["tah"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("config.toml"));
        assert!(args.bind_address.is_none());
        assert!(!args.json_logs);
        assert_eq!(args.max_connections, CliArgs::default().max_connections);
    }

    #[test]
    fn test_overrides() {
        let args = CliArgs::try_parse_from([
            "tah",
            "-c",
            "/etc/tah.toml",
            "--bind",
            "0.0.0.0:9000",
            "-d",
            "cards",
            "-l",
            "debug",
            "--json-logs",
            "--max-connections",
            "50",
        ])
        .unwrap();

        assert_eq!(args.config_path, PathBuf::from("/etc/tah.toml"));
        assert_eq!(args.bind_address.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(args.decks_dir, Some(PathBuf::from("cards")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
        assert_eq!(args.max_connections, Some(50));
    }

    #[test]
    fn test_rejects_non_numeric_limit() {
        assert!(CliArgs::try_parse_from(["tah", "--max-connections", "many"]).is_err());
    }
}
