//! # Trees Against Humanity - game engine
//!
//! Everything about a game that does not involve the network:
//!
//! * **Cards** - [`QuestionCard`] and [`AnswerCard`] values and author-defined [`Deck`]s
//! * **Piles** - [`CardDeck`] draw/discard pairs and the per-game [`PlayDeck`]
//! * **Rounds** - the question in play, the czar and the [`CardSubmission`]s
//! * **Games** - the [`Phase`] machine driving rounds and scoring in [`Game`]
//!
//! The engine is synchronous and holds no locks. Callers that share a game
//! between tasks wrap it in a mutex and hold it for the duration of a single
//! operation.
//!
//! ```rust
//! use std::sync::Arc;
//! use tah_game::{AnswerCard, Deck, DeckId, Game, GameId, Phase, QuestionCard, User, UserId};
//!
//! let deck = Arc::new(Deck {
//!     id: DeckId(1),
//!     name: "Saplings".into(),
//!     question_cards: vec![QuestionCard::new(1, "What killed the ent? ____.", 1)],
//!     answer_cards: (0..30).map(|i| AnswerCard::new(i, format!("Answer {i}"))).collect(),
//! });
//!
//! let mut game = Game::new(GameId(1), "Grove Night", None).unwrap().with_decks(vec![deck]);
//! game.add_player(User { id: UserId(1), username: "alder".into() }, None).unwrap();
//! game.add_player(User { id: UserId(2), username: "aspen".into() }, None).unwrap();
//! game.set_max_points(3).unwrap();
//! game.start().unwrap();
//! assert_eq!(game.phase(), Phase::RoundInProgress);
//! ```

pub mod cards;
pub mod deck;
pub mod error;
pub mod game;
pub mod library;
pub mod phase;
pub mod player;
pub mod round;

pub use cards::{AnswerCard, Card, CardId, Deck, DeckId, DeckInfo, QuestionCard};
pub use deck::{CardDeck, PlayDeck};
pub use error::{DeckError, DeckLoadError, DeckResult, GameError, GameResult, PhaseError};
pub use game::{
    Game, GameId, LobbySettings, DEFAULT_HAND_SIZE, MAX_MAX_POINTS, MIN_MAX_POINTS, MIN_NAME_LENGTH,
    MIN_PLAYERS,
};
pub use library::DeckLibrary;
pub use phase::Phase;
pub use player::{Player, User, UserId};
pub use round::{CardSubmission, Round};
