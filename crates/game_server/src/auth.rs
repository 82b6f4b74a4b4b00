//! Identity collaborator.
//!
//! Token verification lives behind the [`IdentityVerifier`] trait so the
//! server never depends on a particular identity provider. Whatever goes
//! wrong while verifying, including failing to fetch signing keys, comes back
//! as an [`AuthError`] and ends in a rejected request.

use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::handshake::server::Request;

/// Scope required to open rooms through the HTTP handlers.
pub const CREATE_GAMES_SCOPE: &str = "create:games";

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The token's subject claim.
    pub subject: String,
    /// Space separated scopes granted to the token.
    pub scope: String,
}

impl Identity {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.split(' ').any(|s| s == scope)
    }

    pub fn require_scope(&self, scope: &str) -> Result<(), AuthError> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(AuthError::InsufficientScope(scope.to_string()))
        }
    }
}

/// Resolves a bearer token to an [`Identity`].
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Development verifier: any non-empty token is accepted as its own subject
/// and granted a fixed scope.
#[derive(Debug, Clone)]
pub struct DevTokenVerifier {
    scope: String,
}

impl DevTokenVerifier {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for DevTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidToken("empty token".to_string()));
        }
        Ok(Identity {
            subject: token.to_string(),
            scope: self.scope.clone(),
        })
    }
}

/// Extracts the bearer token from a websocket upgrade request.
///
/// The `Authorization: Bearer` header wins; browsers that cannot set headers
/// on a websocket may pass an `access_token` query parameter instead.
pub fn token_from_request(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);
    if from_header.is_some() {
        return from_header;
    }

    request.uri().query().and_then(|query| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, value)| *key == "access_token" && !value.is_empty())
            .map(|(_, value)| value.to_string())
    })
}

/// Parses an `Authorization` header value of the form `Bearer <token>`.
pub fn bearer_token(header: &str) -> Option<String> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}
