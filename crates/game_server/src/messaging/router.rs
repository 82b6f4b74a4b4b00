//! Message routing logic for applying client messages to rooms and games.
//!
//! Each connection owns a [`SessionState`] and hands every decoded
//! [`IncomingMessage`] to the shared [`MessageRouter`]. The router performs
//! the matching registry or game operation and fans the resulting state out
//! through the connection hub. A failed operation is reported to the sender
//! only; the connection stays open.

use crate::auth::Identity;
use crate::connection::{SessionId, Targets};
use crate::context::ServerContext;
use crate::error::{ServerError, ServerResult};
use crate::messaging::types::{IncomingMessage, OutgoingMessage, RoomView, RoundView};
use crate::registry::SharedGame;
use tah_game::{CardId, DeckId, Game, GameError, GameId, LobbySettings, Player, User, UserId};
use tracing::{debug, info};

/// Per-connection protocol state.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session: SessionId,
    pub identity: Identity,
    /// Set by `connect`, cleared by `disconnect`.
    pub user: Option<User>,
    /// The room this user is seated in.
    pub game: Option<GameId>,
}

impl SessionState {
    pub fn new(session: SessionId, identity: Identity) -> Self {
        Self {
            session,
            identity,
            user: None,
            game: None,
        }
    }
}

/// Whether the connection should stay open after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Applies client messages. Shared by every session.
#[derive(Clone)]
pub struct MessageRouter {
    ctx: ServerContext,
}

impl MessageRouter {
    pub fn new(ctx: ServerContext) -> Self {
        Self { ctx }
    }

    /// Decodes and applies one text frame.
    ///
    /// Malformed JSON and failed operations are answered with an `error`
    /// message to the sending session.
    pub async fn route_text(&self, state: &mut SessionState, text: &str) -> Flow {
        let result = match serde_json::from_str::<IncomingMessage>(text) {
            Ok(message) => self.handle(state, message).await,
            Err(e) => Err(ServerError::from(e)),
        };

        match result {
            Ok(flow) => flow,
            Err(e) => {
                debug!(session = %state.session, error = %e, "request rejected");
                self.ctx.hub.send_to(state.session, &OutgoingMessage::error(e.to_string()));
                Flow::Continue
            }
        }
    }

    /// Applies one decoded message.
    ///
    /// # Arguments
    ///
    /// * `state` - Protocol state of the sending connection
    /// * `message` - The decoded client message
    ///
    /// # Returns
    ///
    /// [`Flow::Close`] after a `disconnect`, [`Flow::Continue`] otherwise, or
    /// the error to report back to the client.
    pub async fn handle(
        &self,
        state: &mut SessionState,
        message: IncomingMessage,
    ) -> ServerResult<Flow> {
        match message {
            IncomingMessage::Connect { username } => self.connect(state, &username).await?,
            IncomingMessage::Disconnect => {
                self.disconnect(state).await;
                return Ok(Flow::Close);
            }
            IncomingMessage::CreateGame { name, password } => {
                self.create_game(state, &name, password).await?
            }
            IncomingMessage::JoinGame { game_id, password } => {
                self.join_game(state, game_id, password.as_deref()).await?
            }
            IncomingMessage::LeaveGame => self.leave_game(state).await?,
            IncomingMessage::SubmitCards { cards } => self.submit_cards(state, &cards).await?,
            IncomingMessage::SelectWinner { submission } => {
                self.select_winner(state, submission).await?
            }
            IncomingMessage::UpdateSettings {
                name,
                max_points,
                decks,
            } => self.update_settings(state, name, max_points, decks).await?,
            IncomingMessage::StartGame => self.start_game(state).await?,
            IncomingMessage::AdvanceRound => self.advance_round(state).await?,
        }
        Ok(Flow::Continue)
    }

    /// Logs the session's user out: leaves their room and frees the username.
    ///
    /// Safe to call more than once.
    pub async fn disconnect(&self, state: &mut SessionState) {
        if state.game.is_some() {
            if let Err(e) = self.leave_game(state).await {
                debug!(session = %state.session, error = %e, "leave on disconnect failed");
            }
        }
        if let Some(user) = state.user.take() {
            if let Err(e) = self.ctx.registry.remove_user(user.id).await {
                debug!(session = %state.session, error = %e, "user already removed");
            }
            self.ctx.hub.identify(state.session, None);
            info!("👋 User {} '{}' signed out", user.id, user.username);
        }
    }

    async fn connect(&self, state: &mut SessionState, username: &str) -> ServerResult<()> {
        if state.user.is_some() {
            return Err(ServerError::Session("Already connected".to_string()));
        }
        let user = self.ctx.registry.add_user(username).await?;
        info!(
            "👋 User {} '{}' signed in (subject {})",
            user.id, user.username, state.identity.subject
        );

        self.ctx.hub.identify(state.session, Some(user.id));
        self.ctx.hub.send_to(state.session, &OutgoingMessage::Connected(user.clone()));
        let rooms = self.ctx.registry.list_rooms().await;
        self.ctx.hub.send_to(state.session, &OutgoingMessage::FullGamesList(rooms));
        state.user = Some(user);
        Ok(())
    }

    async fn create_game(
        &self,
        state: &mut SessionState,
        name: &str,
        password: Option<String>,
    ) -> ServerResult<()> {
        let user = signed_in(state)?.clone();
        if state.game.is_some() {
            return Err(GameError::AlreadyInGame.into());
        }

        let (room, shared) = self
            .ctx
            .registry
            .open_room(name, password, self.ctx.decks.all(), user)
            .await?;
        state.game = Some(room.id);
        self.publish(&*shared.lock().await);

        self.broadcast_rooms().await;
        Ok(())
    }

    async fn join_game(
        &self,
        state: &mut SessionState,
        id: GameId,
        password: Option<&str>,
    ) -> ServerResult<()> {
        let user = signed_in(state)?.clone();
        if state.game.is_some() {
            return Err(GameError::AlreadyInGame.into());
        }

        let shared = self.ctx.registry.join_room(id, user, password).await?;
        state.game = Some(id);
        self.publish(&*shared.lock().await);
        Ok(())
    }

    async fn leave_game(&self, state: &mut SessionState) -> ServerResult<()> {
        let user = signed_in(state)?.id;
        let id = state.game.take().ok_or(GameError::NotInGame)?;
        let shared = self.ctx.registry.game(id).await?;
        {
            let mut game = shared.lock().await;
            game.remove_player(user)?;
            self.publish(&game);
        }

        if self.ctx.registry.remove_game_if_empty(id).await {
            self.broadcast_rooms().await;
        } else {
            let rooms = self.ctx.registry.list_rooms().await;
            self.ctx.hub.send_to(state.session, &OutgoingMessage::FullGamesList(rooms));
        }
        Ok(())
    }

    async fn submit_cards(&self, state: &SessionState, cards: &[CardId]) -> ServerResult<()> {
        let (user, shared) = self.seated(state).await?;
        let mut game = shared.lock().await;
        game.submit_cards(user, cards)?;
        self.publish(&game);
        Ok(())
    }

    async fn select_winner(&self, state: &SessionState, submission: usize) -> ServerResult<()> {
        let (user, shared) = self.seated(state).await?;
        let mut game = shared.lock().await;
        game.select_winner(user, submission)?;
        self.publish(&game);
        Ok(())
    }

    /// Applies deck selection, point target and name together, or nothing.
    async fn update_settings(
        &self,
        state: &SessionState,
        name: Option<String>,
        max_points: Option<u32>,
        decks: Option<Vec<DeckId>>,
    ) -> ServerResult<()> {
        let (user, shared) = self.seated(state).await?;
        let id = state.game.ok_or(GameError::NotInGame)?;
        let decks = decks.map(|ids| self.ctx.decks.select(&ids)).transpose()?;
        let settings = LobbySettings {
            name,
            max_points,
            decks,
        };

        let (_, renamed) = self.ctx.registry.update_room(id, user, settings).await?;
        if renamed {
            self.broadcast_rooms().await;
        }
        self.publish(&*shared.lock().await);
        Ok(())
    }

    async fn start_game(&self, state: &SessionState) -> ServerResult<()> {
        let (user, shared) = self.seated(state).await?;
        let mut game = shared.lock().await;
        game.ensure_host(user)?;
        game.start()?;
        self.publish(&game);
        Ok(())
    }

    async fn advance_round(&self, state: &SessionState) -> ServerResult<()> {
        let (user, shared) = self.seated(state).await?;
        let mut game = shared.lock().await;
        if !game.is_player(user) {
            return Err(GameError::NotInGame.into());
        }
        game.advance_round()?;
        self.publish(&game);
        Ok(())
    }

    async fn seated(&self, state: &SessionState) -> ServerResult<(UserId, SharedGame)> {
        let user = signed_in(state)?.id;
        let id = state.game.ok_or(GameError::NotInGame)?;
        Ok((user, self.ctx.registry.game(id).await?))
    }

    /// Sends the room, the round and each player's own hand to the table.
    fn publish(&self, game: &Game) {
        let seated: Vec<UserId> = game.players().iter().map(Player::id).collect();
        let hub = &self.ctx.hub;

        hub.broadcast(
            &OutgoingMessage::RoomUpdate(RoomView::from(game)),
            Targets::Users(seated.clone()),
        );
        if let Some(round) = RoundView::from_game(game) {
            hub.broadcast(&OutgoingMessage::RoundUpdate(round), Targets::Users(seated));
        }
        for player in game.players() {
            hub.broadcast(
                &OutgoingMessage::HandUpdate {
                    cards: player.hand.clone(),
                },
                Targets::Users(vec![player.id()]),
            );
        }
    }

    async fn broadcast_rooms(&self) {
        let rooms = self.ctx.registry.list_rooms().await;
        self.ctx.hub.broadcast(&OutgoingMessage::FullGamesList(rooms), Targets::All);
    }
}

fn signed_in(state: &SessionState) -> ServerResult<&User> {
    state
        .user
        .as_ref()
        .ok_or_else(|| ServerError::Session("Connect with a username first".to_string()))
}
