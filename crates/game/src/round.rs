//! One hand of play: the question, the czar and the submitted answers.

use crate::cards::{AnswerCard, QuestionCard};
use crate::player::UserId;
use rand::seq::SliceRandom;
use rand::Rng;

/// The answer cards one player put forward for the current question.
#[derive(Debug, Clone)]
pub struct CardSubmission {
    pub player: UserId,
    pub cards: Vec<AnswerCard>,
}

/// Live state of the current round.
///
/// Once a winner is recorded the round is resolved: its cards have already
/// been returned to the discard piles and what remains here is a record for
/// display until the next round replaces it.
#[derive(Debug, Clone)]
pub struct Round {
    pub czar: UserId,
    pub question: QuestionCard,
    /// In arrival order until every card is in, then shuffled.
    pub submissions: Vec<CardSubmission>,
    pub winner: Option<UserId>,
}

impl Round {
    pub fn new(czar: UserId, question: QuestionCard) -> Self {
        Self {
            czar,
            question,
            submissions: Vec::new(),
            winner: None,
        }
    }

    pub fn has_submitted(&self, player: UserId) -> bool {
        self.submissions.iter().any(|s| s.player == player)
    }

    pub fn is_resolved(&self) -> bool {
        self.winner.is_some()
    }

    /// Removes the submission made by `player`, if any.
    pub fn withdraw(&mut self, player: UserId) -> Option<CardSubmission> {
        let index = self.submissions.iter().position(|s| s.player == player)?;
        Some(self.submissions.remove(index))
    }

    /// Puts the submissions in random order, hiding who played first.
    pub fn shuffle_submissions<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.submissions.shuffle(rng);
    }

    pub fn submitted_cards(&self) -> impl Iterator<Item = &AnswerCard> {
        self.submissions.iter().flat_map(|s| s.cards.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdraw_keeps_arrival_order() {
        let mut round = Round::new(UserId(1), QuestionCard::new(1, "____?", 1));
        for (player, card) in [(2, 10), (3, 11), (4, 12)] {
            round.submissions.push(CardSubmission {
                player: UserId(player),
                cards: vec![AnswerCard::new(card, "leaf")],
            });
        }

        assert!(round.has_submitted(UserId(3)));
        let withdrawn = round.withdraw(UserId(3)).unwrap();
        assert_eq!(withdrawn.cards[0].id.0, 11);
        assert!(!round.has_submitted(UserId(3)));
        let order: Vec<u64> = round.submissions.iter().map(|s| s.player.0).collect();
        assert_eq!(order, vec![2, 4]);
        assert!(round.withdraw(UserId(9)).is_none());
        assert_eq!(round.submitted_cards().count(), 2);
    }
}
