//! # Trees Against Humanity server
//!
//! Entry point: parses the command line, loads the configuration file, sets
//! up logging, loads the source decks and serves websocket clients until a
//! termination signal arrives.

mod cli;
mod config;
mod logging;
mod signals;

use anyhow::Context;
use clap::Parser;
use cli::CliArgs;
use config::AppConfig;
use std::sync::Arc;
use tah_game::DeckLibrary;
use tah_server::{DevTokenVerifier, GameServer};
use tracing::{error, info, warn};

/// Folds command-line overrides into the loaded configuration.
fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(bind_address) = &args.bind_address {
        config.server.bind_address = bind_address.clone();
    }
    if let Some(decks_dir) = &args.decks_dir {
        config.game.decks_dir = decks_dir.to_string_lossy().to_string();
    }
    if let Some(log_level) = &args.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(max_connections) = args.max_connections {
        config.server.max_connections = max_connections;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path)
        .await
        .with_context(|| format!("Failed to load {}", args.config_path.display()))?;
    apply_overrides(&mut config, &args);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

    logging::setup_logging(&config.logging)?;

    let decks_dir = config.decks_dir();
    let decks = if decks_dir.is_dir() {
        DeckLibrary::load_from_dir(&decks_dir)
            .with_context(|| format!("Failed to load decks from {}", decks_dir.display()))?
    } else {
        warn!("📂 Deck directory {} not found, games will have no cards", decks_dir.display());
        DeckLibrary::default()
    };

    let server_config = config.to_server_config()?;
    let verifier = Arc::new(DevTokenVerifier::new(server_config.dev_scope.clone()));
    let server = GameServer::new(server_config, decks, verifier);

    info!("🌳 Trees Against Humanity server v{}", env!("CARGO_PKG_VERSION"));
    info!("  🌐 Bind address: {}", config.server.bind_address);
    info!("  👥 Max connections: {}", config.server.max_connections);
    info!("  🃏 Hand size: {}", config.game.hand_size);

    tokio::select! {
        result = server.start() => {
            if let Err(e) = result {
                error!("❌ Server error: {}", e);
                return Err(e.into());
            }
        }
        result = signals::wait_for_shutdown_signal() => {
            result.context("Failed to install signal handlers")?;
            info!("🛑 Shutting down");
            server.shutdown();
        }
    }

    info!("✅ Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_apply_overrides() {
        let mut config = AppConfig::default();
        let args = CliArgs {
            bind_address: Some("0.0.0.0:9000".into()),
            decks_dir: Some(PathBuf::from("cards")),
            log_level: Some("trace".into()),
            json_logs: true,
            max_connections: Some(5),
            ..CliArgs::default()
        };

        apply_overrides(&mut config, &args);
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.game.decks_dir, "cards");
        assert_eq!(config.logging.level, "trace");
        assert!(config.logging.json_format);
        assert_eq!(config.server.max_connections, 5);
    }

    #[test]
    fn test_no_overrides_keeps_file_values() {
        let mut config = AppConfig::default();
        config.server.bind_address = "10.0.0.1:8000".into();
        apply_overrides(&mut config, &CliArgs::default());
        assert_eq!(config.server.bind_address, "10.0.0.1:8000");
        assert!(!config.logging.json_format);
    }
}
