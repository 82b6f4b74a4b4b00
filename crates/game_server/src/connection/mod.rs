//! Live client connections.
//!
//! The [`ConnectionHub`] owns the set of registered sessions and is the only
//! place that set is mutated. Every [`ClientSession`] talks to it through a
//! cloneable [`HubHandle`].

pub mod hub;
pub mod session;

pub use hub::{ConnectionHub, HubEvent, HubHandle, Targets};
pub use session::ClientSession;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of one physical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
