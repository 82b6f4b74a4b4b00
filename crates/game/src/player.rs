//! Users and the per-game player state attached to them.

use crate::cards::{AnswerCard, CardId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier allocated to a user when they connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// A user's seat in a game.
#[derive(Debug, Clone)]
pub struct Player {
    /// Copy of the registry's user record; the registry owns the user.
    pub user: User,
    pub hand: Vec<AnswerCard>,
    pub score: u32,
}

impl Player {
    pub fn new(user: User) -> Self {
        Self {
            user,
            hand: Vec::new(),
            score: 0,
        }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn holds(&self, card: CardId) -> bool {
        self.hand.iter().any(|c| c.id == card)
    }

    /// Number of cards needed to bring the hand up to `target`.
    pub fn missing_cards(&self, target: usize) -> usize {
        target.saturating_sub(self.hand.len())
    }

    pub(crate) fn take_card(&mut self, card: CardId) -> Option<AnswerCard> {
        let index = self.hand.iter().position(|c| c.id == card)?;
        Some(self.hand.remove(index))
    }
}
