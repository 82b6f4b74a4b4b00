//! HTTP collaborator handlers.
//!
//! These functions implement `GET /api/games` and `POST /api/games` without
//! committing to an HTTP framework: each returns an [`ApiResponse`] that the
//! embedding router serializes. Authentication happens before a handler is
//! called; handlers only receive the verified [`Identity`], if any.

use crate::auth::{Identity, CREATE_GAMES_SCOPE};
use crate::connection::Targets;
use crate::context::ServerContext;
use crate::error::RegistryError;
use crate::messaging::OutgoingMessage;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Status code and JSON body of a handler result.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

/// Body of `POST /api/games`.
#[derive(Debug, Deserialize)]
struct CreateGameRequest {
    name: String,
    #[serde(default)]
    password: Option<String>,
}

/// `GET /api/games`: every active room.
pub async fn list_games(ctx: &ServerContext) -> ApiResponse {
    let rooms = ctx.registry.list_rooms().await;
    ApiResponse::ok(200, json!(rooms))
}

/// `POST /api/games`: opens a room and announces it to every session.
///
/// Requires an identity carrying the `create:games` scope. The room starts
/// empty; its creator joins over the websocket like everyone else.
pub async fn create_game(
    ctx: &ServerContext,
    identity: Option<&Identity>,
    body: &[u8],
) -> ApiResponse {
    let Some(identity) = identity else {
        return ApiResponse::error(401, "Authentication required");
    };
    if let Err(e) = identity.require_scope(CREATE_GAMES_SCOPE) {
        return ApiResponse::error(403, e.to_string());
    }

    let request: CreateGameRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => return ApiResponse::error(400, format!("Invalid request body: {e}")),
    };

    match ctx
        .registry
        .create_room(&request.name, request.password, ctx.decks.all())
        .await
    {
        Ok((room, _)) => {
            info!(
                "🌐 Room {} '{}' created over HTTP by {}",
                room.id, room.name, identity.subject
            );
            let rooms = ctx.registry.list_rooms().await;
            ctx.hub.broadcast(&OutgoingMessage::FullGamesList(rooms), Targets::All);
            ApiResponse::ok(201, json!(room))
        }
        Err(e) => {
            debug!(error = %e, "room creation rejected");
            let status = match e {
                RegistryError::NameTaken(_) => 409,
                RegistryError::NameTooShort { .. } => 422,
                _ => 400,
            };
            ApiResponse::error(status, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionHub, SessionId};
    use crate::registry::Registry;
    use tah_game::DeckLibrary;
    use tokio::sync::mpsc;

    fn context() -> ServerContext {
        ServerContext::new(Registry::default(), ConnectionHub::spawn(), DeckLibrary::default())
    }

    fn creator() -> Identity {
        Identity {
            subject: "auth0|alder".into(),
            scope: "play create:games".into(),
        }
    }

    #[tokio::test]
    async fn test_list_games() {
        let ctx = context();
        assert_eq!(list_games(&ctx).await, ApiResponse::ok(200, json!([])));

        ctx.registry.create_room("Alpha", Some("secret".into()), Vec::new()).await.unwrap();
        let response = list_games(&ctx).await;
        assert_eq!(response.body, json!([{"id": 1, "name": "Alpha"}]));
    }

    #[tokio::test]
    async fn test_create_game_statuses() {
        let ctx = context();
        let identity = creator();
        let body = br#"{"name": "Alpha", "password": "pw"}"#;

        assert_eq!(create_game(&ctx, None, body).await.status, 401);

        let player = Identity {
            subject: "auth0|aspen".into(),
            scope: "play".into(),
        };
        assert_eq!(create_game(&ctx, Some(&player), body).await.status, 403);

        assert_eq!(create_game(&ctx, Some(&identity), b"{\"nom\": 1}").await.status, 400);

        let created = create_game(&ctx, Some(&identity), body).await;
        assert_eq!(created, ApiResponse::ok(201, json!({"id": 1, "name": "Alpha"})));

        let taken = create_game(&ctx, Some(&identity), body).await;
        assert_eq!(taken.status, 409);
        assert!(taken.body["error"].as_str().unwrap().contains("Alpha"));

        let short = create_game(&ctx, Some(&identity), br#"{"name": "Elm"}"#).await;
        assert_eq!(short.status, 422);
        assert_eq!(ctx.registry.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_game_broadcasts_room_list() {
        let ctx = context();
        let (tx, mut rx) = mpsc::channel(8);
        ctx.hub.register(SessionId::new(), tx);

        create_game(&ctx, Some(&creator()), br#"{"name": "Beta Grove"}"#).await;
        ctx.hub.session_count().await;

        let message = rx.try_recv().unwrap();
        let value: Value = serde_json::from_str(message.to_text().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "fullGamesList", "data": [{"id": 1, "name": "Beta Grove"}]})
        );
    }
}
