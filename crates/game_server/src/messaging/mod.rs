//! Client protocol: message types and the router that applies them.

pub mod router;
pub mod types;

pub use router::{Flow, MessageRouter, SessionState};
pub use types::{IncomingMessage, OutgoingMessage, PlayerView, RoomView, RoundView, SubmissionView};
