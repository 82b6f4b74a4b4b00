//! The game phase machine.
//!
//! Every mutating operation is gated on the current [`Phase`] and checks all
//! of its preconditions before touching any state. A call that returns an
//! error therefore leaves the game exactly as it found it.
//!
//! ## Card ownership
//!
//! Answer cards live in exactly one of: the answer draw pile, the answer
//! discard pile, a player's hand, or an unresolved submission. The current
//! question lives in the unresolved round until the czar picks a winner, at
//! which point it and all submitted answers go to their discard piles.

use crate::cards::{AnswerCard, CardId, Deck};
use crate::deck::PlayDeck;
use crate::error::{GameError, GameResult};
use crate::phase::Phase;
use crate::player::{Player, User, UserId};
use crate::round::{CardSubmission, Round};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cards every player holds between rounds.
pub const DEFAULT_HAND_SIZE: usize = 10;

/// Shortest accepted game name, in characters.
pub const MIN_NAME_LENGTH: usize = 4;

/// Inclusive bounds for [`Game::set_max_points`].
pub const MIN_MAX_POINTS: u32 = 3;
pub const MAX_MAX_POINTS: u32 = 9;

/// A czar and at least one player to judge.
pub const MIN_PLAYERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lobby settings changed together by the host. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct LobbySettings {
    pub name: Option<String>,
    pub max_points: Option<u32>,
    pub decks: Option<Vec<Arc<Deck>>>,
}

#[derive(Debug)]
pub struct Game {
    id: GameId,
    name: String,
    password: Option<String>,
    max_points: u32,
    hand_size: usize,
    phase: Phase,
    players: Vec<Player>,
    decks: Vec<Arc<Deck>>,
    play_deck: Option<PlayDeck>,
    round: Option<Round>,
    /// Seat whose turn it was to judge most recently.
    czar_seat: usize,
    /// Seeds the play deck and orders revealed submissions.
    rng: ChaCha8Rng,
}

impl Game {
    /// Creates a game in the lobby. An empty password means no password.
    pub fn new(id: GameId, name: impl Into<String>, password: Option<String>) -> GameResult<Self> {
        let name = name.into();
        validate_name(&name)?;

        Ok(Self {
            id,
            name,
            password: password.filter(|p| !p.is_empty()),
            max_points: 0,
            hand_size: DEFAULT_HAND_SIZE,
            phase: Phase::Lobby,
            players: Vec::new(),
            decks: Vec::new(),
            play_deck: None,
            round: None,
            czar_seat: 0,
            rng: ChaCha8Rng::from_entropy(),
        })
    }

    pub fn with_hand_size(mut self, hand_size: usize) -> Self {
        self.hand_size = hand_size;
        self
    }

    pub fn with_decks(mut self, decks: Vec<Arc<Deck>>) -> Self {
        self.decks = decks;
        self
    }

    /// Makes shuffles and submission order reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn max_points(&self) -> u32 {
        self.max_points
    }

    pub fn hand_size(&self) -> usize {
        self.hand_size
    }

    /// Players in seat order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, user: UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == user)
    }

    pub fn is_player(&self, user: UserId) -> bool {
        self.player(user).is_some()
    }

    /// The player in seat 0 runs the lobby.
    pub fn host(&self) -> Option<UserId> {
        self.players.first().map(Player::id)
    }

    pub fn decks(&self) -> &[Arc<Deck>] {
        &self.decks
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn czar(&self) -> Option<UserId> {
        self.round.as_ref().map(|r| r.czar)
    }

    pub fn play_deck(&self) -> Option<&PlayDeck> {
        self.play_deck.as_ref()
    }

    /// Every player at or above the point target. Ties are not broken.
    pub fn winners(&self) -> Vec<UserId> {
        if self.max_points == 0 {
            return Vec::new();
        }
        self.players
            .iter()
            .filter(|p| p.score >= self.max_points)
            .map(Player::id)
            .collect()
    }

    /// Answer cards currently out of the piles: hands plus unresolved submissions.
    pub fn answer_cards_in_play(&self) -> Vec<&AnswerCard> {
        let submitted = self
            .round
            .iter()
            .filter(|r| !r.is_resolved())
            .flat_map(Round::submitted_cards);
        self.players
            .iter()
            .flat_map(|p| p.hand.iter())
            .chain(submitted)
            .collect()
    }

    /// Fails with [`GameError::NotHost`] unless `user` is the host.
    pub fn ensure_host(&self, user: UserId) -> GameResult<()> {
        if self.host() == Some(user) {
            Ok(())
        } else {
            Err(GameError::NotHost)
        }
    }

    pub fn set_max_points(&mut self, points: u32) -> GameResult<()> {
        self.expect_phase(Phase::Lobby)?;
        validate_max_points(points)?;
        self.max_points = points;
        Ok(())
    }

    /// Applies every field of `settings` or, on any error, none of them.
    pub fn update_settings(&mut self, settings: LobbySettings) -> GameResult<()> {
        self.expect_phase(Phase::Lobby)?;
        if let Some(name) = &settings.name {
            validate_name(name)?;
        }
        if let Some(points) = settings.max_points {
            validate_max_points(points)?;
        }
        if settings.decks.as_ref().is_some_and(Vec::is_empty) {
            return Err(GameError::EmptyDeckSet);
        }

        if let Some(decks) = settings.decks {
            self.decks = decks;
        }
        if let Some(points) = settings.max_points {
            self.max_points = points;
        }
        if let Some(name) = settings.name {
            self.name = name;
        }
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> GameResult<()> {
        self.expect_phase(Phase::Lobby)?;
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    pub fn set_decks(&mut self, decks: Vec<Arc<Deck>>) -> GameResult<()> {
        self.expect_phase(Phase::Lobby)?;
        if decks.is_empty() {
            return Err(GameError::EmptyDeckSet);
        }
        self.decks = decks;
        Ok(())
    }

    /// Seats `user` at the end of the table.
    pub fn add_player(&mut self, user: User, password: Option<&str>) -> GameResult<()> {
        self.expect_phase(Phase::Lobby)?;
        if self.is_player(user.id) {
            return Err(GameError::AlreadyInGame);
        }
        if let Some(expected) = &self.password {
            if password != Some(expected.as_str()) {
                return Err(GameError::WrongPassword);
            }
        }

        debug!(game = %self.id, user = %user.id, "player joined");
        self.players.push(Player::new(user));
        Ok(())
    }

    /// Removes `user` from the game in any phase.
    ///
    /// The player's hand and any pending submission go to the answer discard
    /// pile. A missing player never blocks the round: completion is
    /// re-evaluated, a round that lost its czar or all of its submissions is
    /// replaced, and a running game left with too few players ends.
    pub fn remove_player(&mut self, user: UserId) -> GameResult<Player> {
        let seat = self.seat_of(user).ok_or(GameError::NotInGame)?;
        let mut player = self.players.remove(seat);

        if let Some(play_deck) = self.play_deck.as_mut() {
            for card in player.hand.drain(..) {
                play_deck.discard_answer(card);
            }
        }
        if seat < self.czar_seat || (seat == self.czar_seat && seat > 0) {
            self.czar_seat -= 1;
        } else if seat == self.czar_seat && !self.players.is_empty() {
            // Seat 0 left; rotation continues with whoever sits there now.
            self.czar_seat = self.players.len() - 1;
        }

        debug!(game = %self.id, user = %user, phase = %self.phase, "player left");

        if !self.phase.is_running() {
            return Ok(player);
        }
        if self.players.len() < MIN_PLAYERS {
            info!(game = %self.id, "not enough players left, ending game");
            self.discard_round();
            self.phase = Phase::EndOfGame;
            return Ok(player);
        }

        match self.phase {
            Phase::RoundInProgress | Phase::WinnerSelection => {
                let czar_left = self.czar() == Some(user);
                if let (Some(round), Some(play_deck)) =
                    (self.round.as_mut(), self.play_deck.as_mut())
                {
                    if let Some(submission) = round.withdraw(user) {
                        for card in submission.cards {
                            play_deck.discard_answer(card);
                        }
                    }
                }
                let no_submissions = self.round.as_ref().map_or(true, |r| r.submissions.is_empty());

                if czar_left || (self.phase == Phase::WinnerSelection && no_submissions) {
                    self.void_round();
                } else {
                    self.check_round_complete();
                }
            }
            _ => {}
        }
        Ok(player)
    }

    /// Deals hands, draws the first question and seats the first czar.
    pub fn start(&mut self) -> GameResult<()> {
        self.expect_phase(Phase::Lobby)?;
        if self.max_points < 1 {
            return Err(GameError::MaxPointsNotSet);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                min: MIN_PLAYERS,
                got: self.players.len(),
            });
        }
        let seed = self.rng.gen();
        let mut play_deck = PlayDeck::from_decks_seeded(self.decks.iter().map(Arc::as_ref), seed)
            .map_err(|_| GameError::EmptyDeckSet)?;
        let question = play_deck.draw_question()?;

        for player in &mut self.players {
            player.score = 0;
        }
        self.czar_seat = 0;
        let czar = self.players[0].id();
        let play_deck = self.play_deck.insert(play_deck);
        deal_all(self.id, play_deck, &mut self.players, self.hand_size);
        self.round = Some(Round::new(czar, question));
        self.phase = Phase::RoundInProgress;

        info!(game = %self.id, players = self.players.len(), "game started");
        Ok(())
    }

    /// Plays `cards` from `user`'s hand for the current question.
    ///
    /// Moves the game to [`Phase::WinnerSelection`] once every non-czar
    /// player has submitted.
    pub fn submit_cards(&mut self, user: UserId, cards: &[CardId]) -> GameResult<()> {
        self.expect_phase(Phase::RoundInProgress)?;
        let round = self.round.as_ref().ok_or(GameError::WrongPhase(self.phase))?;
        let seat = self.seat_of(user).ok_or(GameError::NotInGame)?;
        if round.czar == user {
            return Err(GameError::CzarCannotSubmit);
        }
        if round.has_submitted(user) {
            return Err(GameError::AlreadySubmitted);
        }
        let expected = round.question.answers_required();
        if cards.len() != expected {
            return Err(GameError::WrongCardCount {
                expected,
                got: cards.len(),
            });
        }
        let mut seen = HashSet::with_capacity(cards.len());
        for card in cards {
            if !seen.insert(*card) {
                return Err(GameError::DuplicateCard(*card));
            }
            if !self.players[seat].holds(*card) {
                return Err(GameError::CardNotInHand(*card));
            }
        }

        let player = &mut self.players[seat];
        let played: Vec<AnswerCard> = cards.iter().filter_map(|id| player.take_card(*id)).collect();
        if let Some(round) = self.round.as_mut() {
            round.submissions.push(CardSubmission {
                player: user,
                cards: played,
            });
        }
        debug!(game = %self.id, user = %user, "cards submitted");

        self.check_round_complete();
        Ok(())
    }

    /// Awards the point for submission `index` and closes the round.
    pub fn select_winner(&mut self, czar: UserId, index: usize) -> GameResult<UserId> {
        self.expect_phase(Phase::WinnerSelection)?;
        let round = self.round.as_ref().ok_or(GameError::WrongPhase(self.phase))?;
        if round.czar != czar {
            return Err(GameError::NotCzar);
        }
        let winner = round
            .submissions
            .get(index)
            .map(|s| s.player)
            .ok_or(GameError::InvalidSubmission(index))?;
        let seat = self.seat_of(winner).ok_or(GameError::NotInGame)?;
        let play_deck = self.play_deck.as_mut().ok_or(GameError::WrongPhase(self.phase))?;

        self.players[seat].score += 1;
        if let Some(round) = self.round.as_mut() {
            for card in round.submitted_cards() {
                play_deck.discard_answer(card.clone());
            }
            play_deck.discard_question(round.question.clone());
            round.winner = Some(winner);
        }
        self.phase = Phase::EndOfRound;

        info!(game = %self.id, winner = %winner, score = self.players[seat].score, "round won");
        Ok(winner)
    }

    /// Ends the game if someone reached the point target, otherwise starts the
    /// next round with the next seat as czar.
    pub fn advance_round(&mut self) -> GameResult<()> {
        self.expect_phase(Phase::EndOfRound)?;
        if !self.winners().is_empty() {
            self.phase = Phase::EndOfGame;
            info!(game = %self.id, winners = ?self.winners(), "game over");
            return Ok(());
        }
        self.begin_next_round()
    }

    fn begin_next_round(&mut self) -> GameResult<()> {
        let play_deck = self.play_deck.as_mut().ok_or(GameError::WrongPhase(self.phase))?;
        let question = play_deck.draw_question()?;

        self.czar_seat = (self.czar_seat + 1) % self.players.len();
        let czar = self.players[self.czar_seat].id();
        deal_all(self.id, play_deck, &mut self.players, self.hand_size);
        self.round = Some(Round::new(czar, question));
        self.phase = Phase::RoundInProgress;

        debug!(game = %self.id, czar = %czar, "round started");
        Ok(())
    }

    fn check_round_complete(&mut self) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        if self.phase != Phase::RoundInProgress || round.submissions.is_empty() {
            return;
        }
        let all_in = self
            .players
            .iter()
            .filter(|p| p.id() != round.czar)
            .all(|p| round.has_submitted(p.id()));
        if all_in {
            // Arrival order would tell the czar who played what.
            round.shuffle_submissions(&mut self.rng);
            self.phase = Phase::WinnerSelection;
            debug!(game = %self.id, "all cards in, waiting for the czar");
        }
    }

    /// Throws away an unfinished round and deals the next one.
    fn void_round(&mut self) {
        self.discard_round();
        if let Err(e) = self.begin_next_round() {
            warn!(game = %self.id, error = %e, "could not replace voided round, ending game");
            self.phase = Phase::EndOfGame;
        }
    }

    /// Returns the cards of an unresolved round to the discard piles.
    fn discard_round(&mut self) {
        let (Some(round), Some(play_deck)) = (self.round.as_mut(), self.play_deck.as_mut()) else {
            return;
        };
        if round.is_resolved() {
            return;
        }
        for submission in round.submissions.drain(..) {
            for card in submission.cards {
                play_deck.discard_answer(card);
            }
        }
        play_deck.discard_question(round.question.clone());
        self.round = None;
    }

    fn expect_phase(&self, phase: Phase) -> GameResult<()> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::WrongPhase(self.phase))
        }
    }

    fn seat_of(&self, user: UserId) -> Option<usize> {
        self.players.iter().position(|p| p.id() == user)
    }
}

fn validate_name(name: &str) -> GameResult<()> {
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(GameError::InvalidName {
            min: MIN_NAME_LENGTH,
        });
    }
    Ok(())
}

fn validate_max_points(points: u32) -> GameResult<()> {
    if !(MIN_MAX_POINTS..=MAX_MAX_POINTS).contains(&points) {
        return Err(GameError::InvalidMaxPoints {
            min: MIN_MAX_POINTS,
            max: MAX_MAX_POINTS,
            got: points,
        });
    }
    Ok(())
}

/// Tops every hand up to `target`. Running out of answers is not fatal: the
/// short hand is logged and play continues.
fn deal_all(game: GameId, play_deck: &mut PlayDeck, players: &mut [Player], target: usize) {
    for player in players {
        for _ in 0..player.missing_cards(target) {
            match play_deck.draw_answer() {
                Ok(card) => player.hand.push(card),
                Err(e) => {
                    warn!(game = %game, user = %player.id(), error = %e, "could not fill hand");
                    break;
                }
            }
        }
    }
}
