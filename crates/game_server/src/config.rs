//! Server configuration types and defaults.
//!
//! This module contains the configuration structures used to initialize the
//! server: network settings, per-connection session timings and game defaults.

use std::net::SocketAddr;
use std::time::Duration;
use tah_game::DEFAULT_HAND_SIZE;

/// Timings and limits of a single client connection.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Time allowed to write one message to the peer.
    pub write_wait: Duration,

    /// Time allowed between two inbound frames (pongs included) before the
    /// peer is considered gone.
    pub pong_wait: Duration,

    /// How often to ping an idle connection. Must be less than `pong_wait`.
    pub ping_interval: Duration,

    /// Largest inbound message accepted from a peer, in bytes.
    pub max_message_size: usize,

    /// Capacity of the per-session outbound queue.
    pub outbound_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(60);
        Self {
            write_wait: Duration::from_secs(10),
            pong_wait,
            ping_interval: pong_wait * 9 / 10,
            max_message_size: 8192,
            outbound_capacity: 256,
        }
    }
}

/// Configuration structure for the game server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// Per-connection pump settings
    pub session: SessionSettings,

    /// Cards dealt to every player between rounds
    pub hand_size: usize,

    /// Scope granted to development tokens
    pub dev_scope: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            max_connections: 1000,
            session: SessionSettings::default(),
            hand_size: DEFAULT_HAND_SIZE,
            dev_scope: "play create:games".to_string(),
        }
    }
}
