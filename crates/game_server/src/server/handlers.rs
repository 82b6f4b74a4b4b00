//! Per-connection handshake and session startup.

use crate::auth::{token_from_request, IdentityVerifier};
use crate::config::SessionSettings;
use crate::connection::{ClientSession, SessionId};
use crate::context::ServerContext;
use crate::error::{AuthError, ServerError};
use crate::messaging::{MessageRouter, SessionState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tokio_tungstenite::tungstenite::Utf8Bytes;
use tracing::{debug, warn};

/// Upgrades a TCP stream, authenticates the caller and runs the session.
///
/// # Arguments
///
/// * `stream` - The accepted TCP stream
/// * `addr` - Remote address of the client
/// * `ctx` - Shared registry, hub and deck library
/// * `router` - Message router shared by all sessions
/// * `verifier` - Identity collaborator used to check the bearer token
/// * `settings` - Session timings and limits
///
/// # Returns
///
/// `Ok(())` once the session has ended, or the error that prevented it from
/// starting. Handshakes without a token are refused with HTTP 401; a token
/// that fails verification gets a policy close frame.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    ctx: ServerContext,
    router: Arc<MessageRouter>,
    verifier: Arc<dyn IdentityVerifier>,
    settings: SessionSettings,
) -> Result<(), ServerError> {
    let mut token = None;
    let check_token = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        match token_from_request(request) {
            Some(found) => {
                token = Some(found);
                Ok(response)
            }
            None => {
                let mut rejection =
                    ErrorResponse::new(Some(AuthError::MissingCredentials.to_string()));
                *rejection.status_mut() = StatusCode::UNAUTHORIZED;
                Err(rejection)
            }
        }
    };

    let config = WebSocketConfig::default().max_message_size(Some(settings.max_message_size));
    let mut ws = accept_hdr_async_with_config(stream, check_token, Some(config))
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed for {addr}: {e}")))?;

    let token = token.ok_or(AuthError::MissingCredentials)?;
    let identity = match verifier.verify(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!("🚫 Rejected connection from {}: {}", addr, e);
            let frame = CloseFrame {
                code: CloseCode::Policy,
                reason: Utf8Bytes::from_static("authentication failed"),
            };
            if let Err(close_err) = ws.close(Some(frame)).await {
                debug!("Failed to send close frame to {}: {}", addr, close_err);
            }
            return Err(e.into());
        }
    };

    let state = SessionState::new(SessionId::new(), identity);
    ClientSession::new(state, addr, settings, ctx.hub.clone(), router)
        .run(ws)
        .await;
    Ok(())
}
