//! Error types for the card and game engine.

use crate::cards::{CardId, DeckId};
use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error;

/// Failures of a single draw/discard pile pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeckError {
    #[error("Draw pile and discard pile are both empty")]
    DeckExhausted,

    #[error("No source decks were supplied")]
    EmptyDeckSet,
}

/// Failure to turn a string into a [`crate::Phase`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("Invalid game phase: {0:?}")]
    InvalidPhase(String),
}

/// Rejected game operations.
///
/// A `GameError` is always returned before the game is mutated, so the game
/// is left exactly as it was before the failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Game name must be at least {min} characters")]
    InvalidName { min: usize },

    #[error("Max points must be between {min} and {max}, got {got}")]
    InvalidMaxPoints { min: u32, max: u32, got: u32 },

    #[error("Max points have not been set")]
    MaxPointsNotSet,

    #[error("Operation not allowed while the game is in the {0} phase")]
    WrongPhase(crate::Phase),

    #[error("At least {min} players are needed, the game has {got}")]
    NotEnoughPlayers { min: usize, got: usize },

    #[error("No source decks have been selected")]
    EmptyDeckSet,

    #[error("Unknown deck {0}")]
    UnknownDeck(DeckId),

    #[error("Wrong password")]
    WrongPassword,

    #[error("User is already playing in this game")]
    AlreadyInGame,

    #[error("User is not playing in this game")]
    NotInGame,

    #[error("Only the host may do that")]
    NotHost,

    #[error("The czar does not submit cards")]
    CzarCannotSubmit,

    #[error("Only the czar may select the winner")]
    NotCzar,

    #[error("Cards were already submitted this round")]
    AlreadySubmitted,

    #[error("Expected {expected} answer card(s), got {got}")]
    WrongCardCount { expected: usize, got: usize },

    #[error("Card {0} is not in hand")]
    CardNotInHand(CardId),

    #[error("Card {0} was submitted more than once")]
    DuplicateCard(CardId),

    #[error("No submission at index {0}")]
    InvalidSubmission(usize),

    #[error("Ran out of question cards")]
    QuestionsExhausted,

    #[error("Ran out of answer cards")]
    AnswersExhausted,
}

/// Failures while reading source decks from disk.
#[derive(Debug, Error)]
pub enum DeckLoadError {
    #[error("Failed to read {0}: {1}")]
    Io(PathBuf, IoError),

    #[error("Failed to parse deck file {0}: {1}")]
    Parse(PathBuf, serde_json::Error),

    #[error("Deck id {0} is used by more than one deck")]
    DuplicateDeck(DeckId),
}

pub type DeckResult<T> = Result<T, DeckError>;
pub type GameResult<T> = Result<T, GameError>;
