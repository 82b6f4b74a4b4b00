//! State shared by every connection and request handler.

use crate::connection::HubHandle;
use crate::registry::Registry;
use std::sync::Arc;
use tah_game::DeckLibrary;

/// Cheap to clone; every field is a shared handle.
#[derive(Clone)]
pub struct ServerContext {
    pub registry: Arc<Registry>,
    pub hub: HubHandle,
    pub decks: Arc<DeckLibrary>,
}

impl ServerContext {
    pub fn new(registry: Registry, hub: HubHandle, decks: DeckLibrary) -> Self {
        Self {
            registry: Arc::new(registry),
            hub,
            decks: Arc::new(decks),
        }
    }
}
