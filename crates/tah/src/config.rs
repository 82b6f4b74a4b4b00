//! Configuration management for the Trees Against Humanity server.
//!
//! This module handles loading, validation, and conversion of the TOML
//! configuration file into the library's [`ServerConfig`].

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tah_game::DEFAULT_HAND_SIZE;
use tah_server::{ServerConfig, SessionSettings};
use tracing::info;

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub session: SessionTimings,
    #[serde(default)]
    pub game: GameSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Network binding and connection limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "127.0.0.1:8000")
    pub bind_address: String,
    /// Maximum number of concurrent client connections
    pub max_connections: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            max_connections: 1000,
        }
    }
}

/// Websocket pump timings, in whole seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTimings {
    pub write_wait_secs: u64,
    pub pong_wait_secs: u64,
    /// Must be shorter than `pong_wait_secs`
    pub ping_interval_secs: u64,
    /// Largest inbound message, in bytes
    pub max_message_size: usize,
    /// Messages queued per session before it is dropped
    pub outbound_capacity: usize,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            write_wait_secs: 10,
            pong_wait_secs: 60,
            ping_interval_secs: 54,
            max_message_size: 8192,
            outbound_capacity: 256,
        }
    }
}

/// Game defaults and card sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Cards dealt to every player between rounds
    pub hand_size: usize,
    /// Directory holding the source deck JSON files
    pub decks_dir: String,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            hand_size: DEFAULT_HAND_SIZE,
            decks_dir: "decks".to_string(),
        }
    }
}

/// Identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Space-separated scope granted to development tokens
    pub dev_scope: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            dev_scope: "play create:games".to_string(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, a default configuration file is written at
    /// `path` and the defaults are returned.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The loaded or default configuration, or an error if loading/creation failed.
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn decks_dir(&self) -> PathBuf {
        PathBuf::from(&self.game.decks_dir)
    }

    /// Converts the application configuration to the server's configuration.
    ///
    /// Call [`AppConfig::validate`] first; an unparsable bind address is the
    /// only error reported here.
    pub fn to_server_config(&self) -> anyhow::Result<ServerConfig> {
        let bind_address: SocketAddr = self.server.bind_address.parse()?;
        Ok(ServerConfig {
            bind_address,
            max_connections: self.server.max_connections,
            session: SessionSettings {
                write_wait: Duration::from_secs(self.session.write_wait_secs),
                pong_wait: Duration::from_secs(self.session.pong_wait_secs),
                ping_interval: Duration::from_secs(self.session.ping_interval_secs),
                max_message_size: self.session.max_message_size,
                outbound_capacity: self.session.outbound_capacity,
            },
            hand_size: self.game.hand_size,
            dev_scope: self.auth.dev_scope.clone(),
        })
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(format!("Invalid bind address: {}", &self.server.bind_address));
        }

        if self.server.max_connections == 0 {
            return Err("max_connections must be at least 1".to_string());
        }

        if self.session.outbound_capacity == 0 {
            return Err("outbound_capacity must be at least 1".to_string());
        }

        if self.session.write_wait_secs == 0 || self.session.ping_interval_secs == 0 {
            return Err("Session timings must be at least one second".to_string());
        }

        if self.session.ping_interval_secs >= self.session.pong_wait_secs {
            return Err(format!(
                "ping_interval_secs ({}) must be less than pong_wait_secs ({})",
                self.session.ping_interval_secs, self.session.pong_wait_secs
            ));
        }

        if self.game.hand_size == 0 {
            return Err("hand_size must be at least 1".to_string());
        }

        if self.game.decks_dir.is_empty() {
            return Err("Decks directory cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};
    use tokio::fs;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.server.bind_address, "127.0.0.1:8000");
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.session.ping_interval_secs, 54);
        assert_eq!(config.session.max_message_size, 8192);
        assert_eq!(config.game.hand_size, 10);
        assert_eq!(config.game.decks_dir, "decks");
        assert_eq!(config.auth.dev_scope, "play create:games");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8000");

        // The defaults were written out and read back unchanged.
        assert!(path.exists());
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.session.pong_wait_secs, 60);
        assert_eq!(reloaded.game.decks_dir, "decks");
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[server]
bind_address = "0.0.0.0:3000"
max_connections = 20

[session]
pong_wait_secs = 30
ping_interval_secs = 27

[game]
hand_size = 7
decks_dir = "/srv/tah/decks"

[logging]
level = "debug"
json_format = true
"#;

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), toml_content).await.unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:3000");
        assert_eq!(config.server.max_connections, 20);
        assert_eq!(config.session.pong_wait_secs, 30);
        // Missing keys fall back to their defaults.
        assert_eq!(config.session.write_wait_secs, 10);
        assert_eq!(config.game.hand_size, 7);
        assert_eq!(config.decks_dir(), PathBuf::from("/srv/tah/decks"));
        assert_eq!(config.auth.dev_scope, "play create:games");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_file() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[server\nbind_address = ").await.unwrap();
        assert!(AppConfig::load_from_file(temp_file.path()).await.is_err());
    }

    #[test]
    fn test_validate_rejections() {
        let mut config = AppConfig::default();
        config.server.bind_address = "nowhere".into();
        assert!(config.validate().unwrap_err().contains("bind address"));

        let mut config = AppConfig::default();
        config.server.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.session.outbound_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.session.ping_interval_secs = 60;
        assert!(config.validate().unwrap_err().contains("pong_wait_secs"));

        let mut config = AppConfig::default();
        config.game.hand_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "loud".into();
        assert!(config.validate().unwrap_err().contains("Invalid log level"));
    }

    #[test]
    fn test_to_server_config() {
        let mut config = AppConfig::default();
        config.server.bind_address = "0.0.0.0:9000".into();
        config.session.pong_wait_secs = 20;
        config.session.ping_interval_secs = 18;
        config.game.hand_size = 8;
        config.auth.dev_scope = "play".into();

        let server = config.to_server_config().unwrap();
        assert_eq!(server.bind_address.port(), 9000);
        assert_eq!(server.session.pong_wait, Duration::from_secs(20));
        assert_eq!(server.session.ping_interval, Duration::from_secs(18));
        assert_eq!(server.hand_size, 8);
        assert_eq!(server.dev_scope, "play");
    }
}
