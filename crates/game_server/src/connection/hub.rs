//! The connection hub actor.
//!
//! A single task runs [`ConnectionHub::run`] and applies [`HubEvent`]s in the
//! order they arrive. Sessions, the message router and the HTTP handlers only
//! ever hold a [`HubHandle`], so the live-session map has exactly one writer
//! and needs no lock.

use super::SessionId;
use crate::messaging::OutgoingMessage;
use std::collections::HashMap;
use tah_game::UserId;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Recipients of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// Every registered session.
    All,
    Sessions(Vec<SessionId>),
    /// Every session identified as one of these users.
    Users(Vec<UserId>),
}

/// Requests processed by the hub loop.
#[derive(Debug)]
pub enum HubEvent {
    /// Adds a session. The hub keeps the only sender of its outbound queue.
    Register {
        session: SessionId,
        outbound: mpsc::Sender<Message>,
    },
    /// Removes a session and drops its outbound queue, which ends its writer.
    Unregister { session: SessionId },
    /// Binds a session to a user, or clears the binding with `None`.
    Identify {
        session: SessionId,
        user: Option<UserId>,
    },
    Broadcast { message: Message, targets: Targets },
    Count { reply: oneshot::Sender<usize> },
}

struct Registered {
    outbound: mpsc::Sender<Message>,
    user: Option<UserId>,
}

/// Single authority over the live-session set.
pub struct ConnectionHub {
    sessions: HashMap<SessionId, Registered>,
    events: mpsc::UnboundedReceiver<HubEvent>,
}

impl ConnectionHub {
    /// Creates a hub and the handle used to reach it.
    ///
    /// The hub does nothing until [`ConnectionHub::run`] is polled.
    pub fn new() -> (Self, HubHandle) {
        let (sender, events) = mpsc::unbounded_channel();
        let hub = Self {
            sessions: HashMap::new(),
            events,
        };
        (hub, HubHandle { events: sender })
    }

    /// Creates a hub and runs it on its own task.
    pub fn spawn() -> HubHandle {
        let (hub, handle) = Self::new();
        tokio::spawn(hub.run());
        handle
    }

    /// Processes events until every handle has been dropped.
    pub async fn run(mut self) {
        info!("📡 Connection hub started");
        while let Some(event) = self.events.recv().await {
            self.apply(event);
        }
        info!("📡 Connection hub stopped with {} session(s) left", self.sessions.len());
    }

    fn apply(&mut self, event: HubEvent) {
        match event {
            HubEvent::Register { session, outbound } => {
                if self
                    .sessions
                    .insert(session, Registered { outbound, user: None })
                    .is_some()
                {
                    warn!(%session, "session registered twice, replacing");
                }
                debug!(%session, live = self.sessions.len(), "session registered");
            }
            HubEvent::Unregister { session } => {
                // Unknown sessions are fine: a failed broadcast may have dropped it already.
                if self.sessions.remove(&session).is_some() {
                    debug!(%session, live = self.sessions.len(), "session unregistered");
                }
            }
            HubEvent::Identify { session, user } => {
                if let Some(entry) = self.sessions.get_mut(&session) {
                    entry.user = user;
                }
            }
            HubEvent::Broadcast { message, targets } => self.broadcast(message, &targets),
            HubEvent::Count { reply } => {
                let _ = reply.send(self.sessions.len());
            }
        }
    }

    fn broadcast(&mut self, message: Message, targets: &Targets) {
        let recipients: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|(id, entry)| match targets {
                Targets::All => true,
                Targets::Sessions(ids) => ids.contains(id),
                Targets::Users(users) => entry.user.is_some_and(|u| users.contains(&u)),
            })
            .map(|(id, _)| *id)
            .collect();

        let mut dropped = Vec::new();
        for id in recipients {
            if let Some(entry) = self.sessions.get(&id) {
                // A full or closed queue means the peer cannot keep up.
                if let Err(e) = entry.outbound.try_send(message.clone()) {
                    warn!(
                        session = %id,
                        error = %e,
                        "outbound queue unavailable, dropping session"
                    );
                    dropped.push(id);
                }
            }
        }
        for id in dropped {
            self.sessions.remove(&id);
        }
    }
}

/// Cloneable front end of the hub. Sending never blocks.
#[derive(Debug, Clone)]
pub struct HubHandle {
    events: mpsc::UnboundedSender<HubEvent>,
}

impl HubHandle {
    fn send(&self, event: HubEvent) {
        if self.events.send(event).is_err() {
            debug!("connection hub is gone, event discarded");
        }
    }

    pub fn register(&self, session: SessionId, outbound: mpsc::Sender<Message>) {
        self.send(HubEvent::Register { session, outbound });
    }

    pub fn unregister(&self, session: SessionId) {
        self.send(HubEvent::Unregister { session });
    }

    pub fn identify(&self, session: SessionId, user: Option<UserId>) {
        self.send(HubEvent::Identify { session, user });
    }

    /// Serializes `message` once and queues it for every target.
    pub fn broadcast(&self, message: &OutgoingMessage, targets: Targets) {
        match serde_json::to_string(message) {
            Ok(json) => self.send(HubEvent::Broadcast {
                message: Message::text(json),
                targets,
            }),
            Err(e) => warn!(error = %e, "failed to serialize outgoing message"),
        }
    }

    pub fn send_to(&self, session: SessionId, message: &OutgoingMessage) {
        self.broadcast(message, Targets::Sessions(vec![session]));
    }

    /// Number of registered sessions, or 0 if the hub has stopped.
    pub async fn session_count(&self) -> usize {
        let (reply, count) = oneshot::channel();
        self.send(HubEvent::Count { reply });
        count.await.unwrap_or(0)
    }
}
