//! Process-wide registry of users and game rooms.
//!
//! The registry allocates user and game identifiers and enforces name
//! uniqueness. Its maps sit behind a single `RwLock`; each game sits behind
//! its own `Mutex` so that play in one room never waits on another.
//!
//! # Lock order
//!
//! Code that needs both locks takes the registry lock first and the game lock
//! second. Game operations that do not touch the registry only hold the game
//! lock.

use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tah_game::{
    Deck, Game, GameId, LobbySettings, User, UserId, DEFAULT_HAND_SIZE, MIN_NAME_LENGTH,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Public view of a room. The password is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: GameId,
    pub name: String,
}

/// A game shared between the sessions playing it.
pub type SharedGame = Arc<Mutex<Game>>;

struct RoomEntry {
    /// Mirror of the game's name, so listing never takes a game lock.
    name: String,
    game: SharedGame,
}

#[derive(Default)]
struct RegistryState {
    users: BTreeMap<UserId, User>,
    rooms: BTreeMap<GameId, RoomEntry>,
    last_user_id: u64,
    last_game_id: u64,
}

impl RegistryState {
    fn name_taken(&self, name: &str, except: Option<GameId>) -> bool {
        self.rooms
            .iter()
            .any(|(id, room)| Some(*id) != except && room.name == name)
    }
}

/// Users and rooms of one server process.
pub struct Registry {
    state: RwLock<RegistryState>,
    hand_size: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_HAND_SIZE)
    }
}

impl Registry {
    /// Creates an empty registry whose games deal `hand_size` cards.
    pub fn new(hand_size: usize) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            hand_size,
        }
    }

    /// Registers a user under a unique username and allocates their id.
    pub async fn add_user(&self, username: &str) -> RegistryResult<User> {
        if username.chars().count() < MIN_NAME_LENGTH {
            return Err(RegistryError::UsernameTooShort {
                min: MIN_NAME_LENGTH,
            });
        }

        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == username) {
            return Err(RegistryError::UsernameTaken(username.to_string()));
        }

        state.last_user_id += 1;
        let user = User {
            id: UserId(state.last_user_id),
            username: username.to_string(),
        };
        state.users.insert(user.id, user.clone());

        debug!(user = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Forgets a user. Games they play in are left alone.
    pub async fn remove_user(&self, id: UserId) -> RegistryResult<User> {
        let mut state = self.state.write().await;
        let user = state.users.remove(&id).ok_or(RegistryError::UserNotFound(id))?;
        debug!(user = %id, "user removed");
        Ok(user)
    }

    pub async fn user(&self, id: UserId) -> RegistryResult<User> {
        let state = self.state.read().await;
        state.users.get(&id).cloned().ok_or(RegistryError::UserNotFound(id))
    }

    /// Opens a new, empty room in the lobby with the given source decks.
    pub async fn create_room(
        &self,
        name: &str,
        password: Option<String>,
        decks: Vec<Arc<Deck>>,
    ) -> RegistryResult<(RoomInfo, SharedGame)> {
        self.insert_room(name, password, decks, None).await
    }

    /// Opens a new room with `creator` already in seat 0, so nobody can join
    /// ahead of them and take over as host.
    pub async fn open_room(
        &self,
        name: &str,
        password: Option<String>,
        decks: Vec<Arc<Deck>>,
        creator: User,
    ) -> RegistryResult<(RoomInfo, SharedGame)> {
        self.insert_room(name, password, decks, Some(creator)).await
    }

    async fn insert_room(
        &self,
        name: &str,
        password: Option<String>,
        decks: Vec<Arc<Deck>>,
        creator: Option<User>,
    ) -> RegistryResult<(RoomInfo, SharedGame)> {
        if name.chars().count() < MIN_NAME_LENGTH {
            return Err(RegistryError::NameTooShort {
                min: MIN_NAME_LENGTH,
            });
        }

        let mut state = self.state.write().await;
        if state.name_taken(name, None) {
            return Err(RegistryError::NameTaken(name.to_string()));
        }

        let id = GameId(state.last_game_id + 1);
        let seat_password = password.clone();
        let mut game = Game::new(id, name, password)?
            .with_hand_size(self.hand_size)
            .with_decks(decks);
        if let Some(creator) = creator {
            game.add_player(creator, seat_password.as_deref())?;
        }
        state.last_game_id = id.0;

        let game = Arc::new(Mutex::new(game));
        state.rooms.insert(
            id,
            RoomEntry {
                name: name.to_string(),
                game: game.clone(),
            },
        );

        info!("🌲 Room {} '{}' created", id, name);
        Ok((
            RoomInfo {
                id,
                name: name.to_string(),
            },
            game,
        ))
    }

    pub async fn remove_game(&self, id: GameId) -> RegistryResult<()> {
        let mut state = self.state.write().await;
        let room = state.rooms.remove(&id).ok_or(RegistryError::GameNotFound(id))?;
        info!("🪓 Room {} '{}' removed", id, room.name);
        Ok(())
    }

    /// Removes the room if nobody is seated in it.
    ///
    /// Returns `true` when the room was removed. The emptiness check and the
    /// removal happen under the registry lock, so a concurrent join either
    /// lands before the check or finds the room gone.
    pub async fn remove_game_if_empty(&self, id: GameId) -> bool {
        let mut state = self.state.write().await;
        let Some(room) = state.rooms.get(&id) else {
            return false;
        };
        if !room.game.lock().await.players().is_empty() {
            return false;
        }
        if let Some(room) = state.rooms.remove(&id) {
            info!("🍂 Room {} '{}' removed after its last player left", id, room.name);
        }
        true
    }

    /// Every active room, in creation order.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let state = self.state.read().await;
        state
            .rooms
            .iter()
            .map(|(id, room)| RoomInfo {
                id: *id,
                name: room.name.clone(),
            })
            .collect()
    }

    pub async fn game(&self, id: GameId) -> RegistryResult<SharedGame> {
        let state = self.state.read().await;
        state
            .rooms
            .get(&id)
            .map(|room| room.game.clone())
            .ok_or(RegistryError::GameNotFound(id))
    }

    /// Seats `user` in a room.
    ///
    /// The registry lock is held across the join so that the room cannot be
    /// removed as empty between the lookup and the seating.
    pub async fn join_room(
        &self,
        id: GameId,
        user: User,
        password: Option<&str>,
    ) -> RegistryResult<SharedGame> {
        let state = self.state.read().await;
        let room = state.rooms.get(&id).ok_or(RegistryError::GameNotFound(id))?;
        room.game.lock().await.add_player(user, password)?;
        Ok(room.game.clone())
    }

    /// Changes a room's lobby settings on behalf of its host.
    ///
    /// A new name must be unique among rooms. Either every setting is
    /// applied or none is.
    ///
    /// # Returns
    ///
    /// The room's public view, and whether its name changed.
    pub async fn update_room(
        &self,
        id: GameId,
        host: UserId,
        settings: LobbySettings,
    ) -> RegistryResult<(RoomInfo, bool)> {
        if let Some(name) = &settings.name {
            if name.chars().count() < MIN_NAME_LENGTH {
                return Err(RegistryError::NameTooShort {
                    min: MIN_NAME_LENGTH,
                });
            }
        }

        let mut state = self.state.write().await;
        if let Some(name) = &settings.name {
            if state.name_taken(name, Some(id)) {
                return Err(RegistryError::NameTaken(name.clone()));
            }
        }
        let room = state.rooms.get_mut(&id).ok_or(RegistryError::GameNotFound(id))?;

        let mut game = room.game.lock().await;
        game.ensure_host(host)?;
        game.update_settings(settings)?;
        let renamed = room.name != game.name();
        if renamed {
            room.name = game.name().to_string();
            debug!(game = %id, name = %room.name, "room renamed");
        }

        Ok((
            RoomInfo {
                id,
                name: room.name.clone(),
            },
            renamed,
        ))
    }

    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }
}
