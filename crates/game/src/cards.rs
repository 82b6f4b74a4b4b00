//! Card values and source decks.
//!
//! Question and answer cards are separate types so that a question can never
//! end up in an answer pile. Both are immutable values identified by their id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a card within its source deck set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a source deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(pub u32);

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Common behaviour of everything that can sit in a [`crate::CardDeck`].
pub trait Card: Clone + fmt::Debug + Send + Sync + 'static {
    fn id(&self) -> CardId;
}

/// A black card: the prompt of a round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCard {
    pub id: CardId,
    pub text: String,
    #[serde(default = "one")]
    pub num_answers: u32,
}

fn one() -> u32 {
    1
}

impl QuestionCard {
    pub fn new(id: u32, text: impl Into<String>, num_answers: u32) -> Self {
        Self {
            id: CardId(id),
            text: text.into(),
            num_answers,
        }
    }

    /// Number of answer cards a submission must contain.
    ///
    /// Cards authored with `numAnswers: 0` still take one answer.
    pub fn answers_required(&self) -> usize {
        self.num_answers.max(1) as usize
    }
}

impl Card for QuestionCard {
    fn id(&self) -> CardId {
        self.id
    }
}

/// A white card held in a player's hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnswerCard {
    pub id: CardId,
    pub text: String,
}

impl AnswerCard {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self {
            id: CardId(id),
            text: text.into(),
        }
    }
}

impl Card for AnswerCard {
    fn id(&self) -> CardId {
        self.id
    }
}

/// An author-defined bundle of cards, read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    #[serde(default)]
    pub question_cards: Vec<QuestionCard>,
    #[serde(default)]
    pub answer_cards: Vec<AnswerCard>,
}

/// Public summary of a deck, without its cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckInfo {
    pub id: DeckId,
    pub name: String,
    pub question_count: usize,
    pub answer_count: usize,
}

impl From<&Deck> for DeckInfo {
    fn from(deck: &Deck) -> Self {
        Self {
            id: deck.id,
            name: deck.name.clone(),
            question_count: deck.question_cards.len(),
            answer_count: deck.answer_cards.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_json_format() {
        let json = r#"{
            "id": 7,
            "name": "Forest Floor",
            "questionCards": [
                {"id": 1, "text": "What grows best in the dark? ____.", "numAnswers": 1},
                {"id": 2, "text": "____ + ____ = a very old oak."}
            ],
            "answerCards": [
                {"id": 10, "text": "Moss."}
            ]
        }"#;

        let deck: Deck = serde_json::from_str(json).unwrap();
        assert_eq!(deck.id, DeckId(7));
        assert_eq!(deck.question_cards.len(), 2);
        assert_eq!(deck.question_cards[1].num_answers, 1);
        assert_eq!(deck.answer_cards[0].id, CardId(10));

        let value = serde_json::to_value(&deck.question_cards[0]).unwrap();
        assert_eq!(value["numAnswers"], 1);
    }

    #[test]
    fn test_zero_answers_still_requires_one() {
        let card = QuestionCard::new(1, "Why?", 0);
        assert_eq!(card.answers_required(), 1);
        assert_eq!(QuestionCard::new(2, "Pick two", 2).answers_required(), 2);
    }
}
