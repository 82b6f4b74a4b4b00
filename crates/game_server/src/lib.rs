//! # Trees Against Humanity - realtime server
//!
//! Networking and shared state around the [`tah_game`] engine:
//!
//! * **Registry** - users and rooms, with identifier allocation and name uniqueness
//! * **Connection hub** - a single task owning the live-session set and fanning out messages
//! * **Client sessions** - a read pump and a write pump per websocket
//! * **Message router** - applies client messages to rooms and games
//! * **Collaborators** - token verification ([`auth`]) and HTTP handlers ([`api`])
//!
//! ## Message Flow
//!
//! 1. A client opens a websocket with a bearer token; the handshake is refused without one
//! 2. The token is verified and a session is registered with the hub
//! 3. Each text frame is decoded as `{type, data}` and applied by the router
//! 4. The resulting room, round and hand views are queued on the hub for the affected sessions
//! 5. Each session's write pump drains its queue onto the socket
//!
//! ## Concurrency
//!
//! * The live-session set is only touched by the hub task; everything else sends it events
//! * The registry maps sit behind one `RwLock`, each game behind its own `Mutex`
//! * Locks are always taken registry first, game second
//! * Outbound queues are bounded; a session whose queue is full is dropped, never awaited
//!
//! ## Error Handling
//!
//! Failures are typed ([`ServerError`], [`RegistryError`], [`AuthError`]). A
//! failed client request is answered with an `error` message and the
//! connection stays open.

pub use auth::{DevTokenVerifier, Identity, IdentityVerifier};
pub use config::{ServerConfig, SessionSettings};
pub use connection::{ConnectionHub, HubHandle, SessionId, Targets};
pub use context::ServerContext;
pub use error::{AuthError, RegistryError, ServerError};
pub use messaging::{IncomingMessage, OutgoingMessage};
pub use registry::{Registry, RoomInfo};
pub use server::GameServer;

pub mod api;
pub mod auth;
pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod messaging;
pub mod registry;
pub mod server;
