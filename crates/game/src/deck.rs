//! Draw and discard piles.
//!
//! A [`CardDeck`] never creates or destroys cards: every card handed out by
//! [`CardDeck::draw`] is expected to come back through [`CardDeck::discard`]
//! once the game is done with it. When the draw pile runs dry the discard pile
//! is shuffled back in, so a deck only reports [`DeckError::DeckExhausted`]
//! when every card is out in players' hands or submissions.

use crate::cards::{AnswerCard, Card, Deck, QuestionCard};
use crate::error::{DeckError, DeckResult, GameError, GameResult};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// A draw pile plus a discard pile of one card type.
///
/// The top of the draw pile is the end of the underlying vector.
pub struct CardDeck<C: Card> {
    draw_pile: Vec<C>,
    discard_pile: Vec<C>,
    rng: ChaCha8Rng,
}

impl<C: Card> CardDeck<C> {
    /// Creates a deck holding `cards` in its draw pile, unshuffled.
    ///
    /// The random source is seeded once from OS entropy and reused for every
    /// later shuffle.
    pub fn new(cards: Vec<C>) -> Self {
        Self::with_rng(cards, ChaCha8Rng::from_entropy())
    }

    /// Same as [`CardDeck::new`] but with a reproducible shuffle order.
    pub fn with_seed(cards: Vec<C>, seed: u64) -> Self {
        Self::with_rng(cards, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(cards: Vec<C>, rng: ChaCha8Rng) -> Self {
        Self {
            draw_pile: cards,
            discard_pile: Vec::new(),
            rng,
        }
    }

    /// Removes and returns the top card, reshuffling the discard pile into the
    /// draw pile first if the draw pile is empty.
    pub fn draw(&mut self) -> DeckResult<C> {
        if self.draw_pile.is_empty() {
            self.reshuffle();
        }
        self.draw_pile.pop().ok_or(DeckError::DeckExhausted)
    }

    pub fn discard(&mut self, card: C) {
        self.discard_pile.push(card);
    }

    /// Fisher-Yates shuffle of the draw pile.
    pub fn shuffle(&mut self) {
        self.draw_pile.shuffle(&mut self.rng);
    }

    /// Moves the discard pile into the draw pile and shuffles it.
    pub fn reshuffle(&mut self) {
        self.draw_pile.append(&mut self.discard_pile);
        self.shuffle();
    }

    pub fn draw_pile(&self) -> &[C] {
        &self.draw_pile
    }

    pub fn discard_pile(&self) -> &[C] {
        &self.discard_pile
    }

    /// Cards currently in either pile.
    pub fn len(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Card> fmt::Debug for CardDeck<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDeck")
            .field("draw_pile", &self.draw_pile.len())
            .field("discard_pile", &self.discard_pile.len())
            .finish()
    }
}

/// The question and answer piles of one running game.
#[derive(Debug)]
pub struct PlayDeck {
    questions: CardDeck<QuestionCard>,
    answers: CardDeck<AnswerCard>,
}

impl PlayDeck {
    /// Concatenates the cards of every source deck and shuffles both piles.
    pub fn from_decks<'a, I>(decks: I) -> DeckResult<Self>
    where
        I: IntoIterator<Item = &'a Deck>,
    {
        Self::build(decks, ChaCha8Rng::from_entropy(), ChaCha8Rng::from_entropy())
    }

    /// Reproducible variant of [`PlayDeck::from_decks`].
    pub fn from_decks_seeded<'a, I>(decks: I, seed: u64) -> DeckResult<Self>
    where
        I: IntoIterator<Item = &'a Deck>,
    {
        Self::build(
            decks,
            ChaCha8Rng::seed_from_u64(seed),
            ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    fn build<'a, I>(decks: I, question_rng: ChaCha8Rng, answer_rng: ChaCha8Rng) -> DeckResult<Self>
    where
        I: IntoIterator<Item = &'a Deck>,
    {
        let mut questions = Vec::new();
        let mut answers = Vec::new();
        let mut deck_count = 0;
        for deck in decks {
            deck_count += 1;
            questions.extend(deck.question_cards.iter().cloned());
            answers.extend(deck.answer_cards.iter().cloned());
        }
        if deck_count == 0 {
            return Err(DeckError::EmptyDeckSet);
        }

        let mut play_deck = Self {
            questions: CardDeck::with_rng(questions, question_rng),
            answers: CardDeck::with_rng(answers, answer_rng),
        };
        play_deck.questions.shuffle();
        play_deck.answers.shuffle();
        Ok(play_deck)
    }

    pub fn draw_question(&mut self) -> GameResult<QuestionCard> {
        self.questions
            .draw()
            .map_err(|_| GameError::QuestionsExhausted)
    }

    pub fn draw_answer(&mut self) -> GameResult<AnswerCard> {
        self.answers.draw().map_err(|_| GameError::AnswersExhausted)
    }

    pub fn discard_question(&mut self, card: QuestionCard) {
        self.questions.discard(card);
    }

    pub fn discard_answer(&mut self, card: AnswerCard) {
        self.answers.discard(card);
    }

    pub fn questions(&self) -> &CardDeck<QuestionCard> {
        &self.questions
    }

    pub fn answers(&self) -> &CardDeck<AnswerCard> {
        &self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, DeckId};

    fn answers(range: std::ops::Range<u32>) -> Vec<AnswerCard> {
        range.map(|id| AnswerCard::new(id, format!("answer {id}"))).collect()
    }

    fn sorted_ids<'a>(cards: impl IntoIterator<Item = &'a AnswerCard>) -> Vec<CardId> {
        let mut ids: Vec<CardId> = cards.into_iter().map(|c| c.id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_draw_takes_from_top() {
        let mut deck = CardDeck::with_seed(answers(0..3), 1);
        let card = deck.draw().unwrap();
        assert_eq!(card.id, CardId(2));
        assert_eq!(deck.draw_pile().len(), 2);
    }

    #[test]
    fn test_draw_reshuffles_discard_when_empty() {
        let mut deck = CardDeck::with_seed(answers(0..2), 7);
        let first = deck.draw().unwrap();
        let second = deck.draw().unwrap();
        deck.discard(first);
        deck.discard(second);
        assert!(deck.draw_pile().is_empty());

        let drawn = deck.draw().unwrap();
        assert!(deck.discard_pile().is_empty());
        assert_eq!(deck.draw_pile().len(), 1);
        assert!(drawn.id == CardId(0) || drawn.id == CardId(1));
    }

    #[test]
    fn test_exhausted_deck_is_left_empty() {
        let mut deck: CardDeck<AnswerCard> = CardDeck::with_seed(Vec::new(), 3);
        assert_eq!(deck.draw().unwrap_err(), DeckError::DeckExhausted);
        assert!(deck.draw_pile().is_empty());
        assert!(deck.discard_pile().is_empty());

        let mut deck = CardDeck::with_seed(answers(0..1), 3);
        let _held = deck.draw().unwrap();
        assert_eq!(deck.draw().unwrap_err(), DeckError::DeckExhausted);
        assert!(deck.is_empty());
    }

    #[test]
    fn test_cards_are_conserved_across_operations() {
        let seed_set = answers(0..20);
        let expected = sorted_ids(&seed_set);
        let mut deck = CardDeck::with_seed(seed_set, 42);
        let mut held: Vec<AnswerCard> = Vec::new();

        for step in 0..200u32 {
            match step % 5 {
                0 | 1 | 2 => {
                    if let Ok(card) = deck.draw() {
                        held.push(card);
                    }
                }
                3 => {
                    if let Some(card) = held.pop() {
                        deck.discard(card);
                    }
                }
                _ => {
                    if step % 3 == 0 {
                        deck.reshuffle();
                    } else if !held.is_empty() {
                        let card = held.remove(0);
                        deck.discard(card);
                    }
                }
            }

            let all = deck
                .draw_pile()
                .iter()
                .chain(deck.discard_pile())
                .chain(held.iter());
            assert_eq!(sorted_ids(all), expected, "cards diverged at step {step}");
        }
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut deck = CardDeck::with_seed(answers(0..50), 11);
        deck.shuffle();
        assert_eq!(sorted_ids(deck.draw_pile()), sorted_ids(&answers(0..50)));
        let order: Vec<CardId> = deck.draw_pile().iter().map(|c| c.id).collect();
        let identity: Vec<CardId> = (0..50).map(CardId).collect();
        assert_ne!(order, identity);
    }

    #[test]
    fn test_play_deck_requires_source_decks() {
        let err = PlayDeck::from_decks(std::iter::empty()).unwrap_err();
        assert_eq!(err, DeckError::EmptyDeckSet);
    }

    #[test]
    fn test_play_deck_concatenates_sources() {
        let first = Deck {
            id: DeckId(1),
            name: "Roots".into(),
            question_cards: vec![QuestionCard::new(1, "Q1 ____", 1)],
            answer_cards: answers(0..4),
        };
        let second = Deck {
            id: DeckId(2),
            name: "Canopy".into(),
            question_cards: vec![QuestionCard::new(2, "Q2 ____ ____", 2)],
            answer_cards: answers(4..6),
        };

        let mut play_deck = PlayDeck::from_decks_seeded([&first, &second], 5).unwrap();
        assert_eq!(play_deck.questions().draw_pile().len(), 2);
        assert_eq!(play_deck.answers().draw_pile().len(), 6);
        assert!(play_deck.answers().discard_pile().is_empty());

        let question = play_deck.draw_question().unwrap();
        play_deck.discard_question(question);
        let _ = play_deck.draw_question().unwrap();
        let _ = play_deck.draw_question().unwrap();
        assert_eq!(
            play_deck.draw_question().unwrap_err(),
            GameError::QuestionsExhausted
        );
    }
}
