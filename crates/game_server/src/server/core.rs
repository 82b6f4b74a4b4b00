//! Core game server implementation.
//!
//! This module contains the main `GameServer` struct: it owns the shared
//! registry, the connection hub and the deck library, accepts TCP
//! connections and hands each one to its own session task.

use crate::{
    auth::IdentityVerifier,
    config::ServerConfig,
    connection::{ConnectionHub, HubHandle},
    context::ServerContext,
    error::ServerError,
    messaging::MessageRouter,
    registry::Registry,
    server::handlers::handle_connection,
};
use std::sync::Arc;
use tah_game::DeckLibrary;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex, Semaphore};
use tracing::{debug, error, info, warn};

/// The core game server structure.
///
/// `GameServer` ties the server components together:
///
/// * **Registry**: users and rooms, shared by every session
/// * **Connection Hub**: the actor owning the live-session set
/// * **Message Router**: applies client messages to rooms and games
/// * **Identity Verifier**: checks the bearer token of each handshake
///
/// The hub task is spawned when the server starts serving, so a server can
/// be constructed outside of a runtime.
pub struct GameServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Registry, hub handle and deck library
    context: ServerContext,

    /// Router shared by all sessions
    router: Arc<MessageRouter>,

    /// Token verification collaborator
    verifier: Arc<dyn IdentityVerifier>,

    /// The hub loop, until the first call to `serve` takes it
    hub: Mutex<Option<ConnectionHub>>,

    /// Caps concurrent connections at `max_connections`
    connection_slots: Arc<Semaphore>,

    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,
}

impl GameServer {
    /// Creates a new game server.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration parameters for server behavior
    /// * `decks` - Source decks offered to new games
    /// * `verifier` - Identity collaborator for incoming connections
    ///
    /// # Returns
    ///
    /// A new `GameServer` instance ready to be started.
    pub fn new(
        config: ServerConfig,
        decks: DeckLibrary,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let (hub, hub_handle) = ConnectionHub::new();
        let context = ServerContext::new(Registry::new(config.hand_size), hub_handle, decks);
        let router = Arc::new(MessageRouter::new(context.clone()));
        let (shutdown_sender, _) = broadcast::channel(1);

        Self {
            connection_slots: Arc::new(Semaphore::new(config.max_connections)),
            config,
            context,
            router,
            verifier,
            hub: Mutex::new(Some(hub)),
            shutdown_sender,
        }
    }

    /// Shared state, for collaborators such as the HTTP handlers.
    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    pub fn hub(&self) -> &HubHandle {
        &self.context.hub
    }

    /// Binds the configured address and serves until shutdown.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the server stopped cleanly, or a `ServerError` if the
    /// address could not be bound.
    pub async fn start(&self) -> Result<(), ServerError> {
        info!("🚀 Starting game server on {}", self.config.bind_address);
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("Bind failed: {e}")))?;
        self.serve(listener).await
    }

    /// Accepts connections on `listener` until [`GameServer::shutdown`] is called.
    ///
    /// Connections beyond `max_connections` are closed straight away.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        if let Some(hub) = self.hub.lock().await.take() {
            tokio::spawn(hub.run());
        }

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Listener has no address: {e}")))?;
        info!("✅ Listening on {}", local_addr);
        info!("📚 Offering {} deck(s) to new games", self.context.decks.len());

        let mut shutdown_receiver = self.shutdown_sender.subscribe();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };

                    let Ok(permit) = self.connection_slots.clone().try_acquire_owned() else {
                        warn!(
                            "⛔ Connection limit of {} reached, refusing {}",
                            self.config.max_connections, addr
                        );
                        continue;
                    };

                    let ctx = self.context.clone();
                    let router = self.router.clone();
                    let verifier = self.verifier.clone();
                    let settings = self.config.session.clone();
                    tokio::spawn(async move {
                        let handled =
                            handle_connection(stream, addr, ctx, router, verifier, settings).await;
                        if let Err(e) = handled {
                            debug!("Connection from {} ended early: {}", addr, e);
                        }
                        drop(permit);
                    });
                }
                _ = shutdown_receiver.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Stops the accept loop. Sessions already running finish on their own.
    pub fn shutdown(&self) {
        if self.shutdown_sender.send(()).is_err() {
            debug!("Shutdown requested while not serving");
        }
    }
}
