//! Error types for the server crate.

use tah_game::{GameError, GameId, UserId};
use thiserror::Error;

/// Failures of the room and user registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Username must be at least {min} characters")]
    UsernameTooShort { min: usize },

    #[error("Username {0:?} is already taken")]
    UsernameTaken(String),

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Room name must be at least {min} characters")]
    NameTooShort { min: usize },

    #[error("Room name {0:?} is already taken")]
    NameTaken(String),

    #[error("Game {0} not found")]
    GameNotFound(GameId),

    #[error(transparent)]
    Game(#[from] GameError),
}

/// Rejections from the identity collaborator.
///
/// Every variant ends in a refused connection or request, never in a crash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No credentials were presented")]
    MissingCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Could not fetch verification keys: {0}")]
    KeyFetch(String),

    #[error("Missing required scope {0:?}")]
    InsufficientScope(String),
}

/// Top-level server failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::Protocol(format!("Invalid JSON: {e}"))
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
pub type ServerResult<T> = Result<T, ServerError>;
