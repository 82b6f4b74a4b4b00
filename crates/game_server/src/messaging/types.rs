//! Message type definitions for client-server communication.
//!
//! Both directions use the same envelope, an object with a `type` tag and an
//! optional `data` payload:
//!
//! ```json
//! { "type": "submitCards", "data": { "cards": [12, 40] } }
//! ```
//!
//! Views sent to clients are built from a locked [`Game`] and never expose
//! a password, another player's hand, or who played which cards before the
//! czar has chosen.

use crate::registry::RoomInfo;
use serde::{Deserialize, Serialize};
use tah_game::{
    AnswerCard, CardId, DeckId, DeckInfo, Game, GameId, Phase, Player, QuestionCard, User, UserId,
};

/// A message sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum IncomingMessage {
    /// Logs in under a username.
    Connect { username: String },

    /// Logs out and closes the connection.
    Disconnect,

    CreateGame {
        name: String,
        #[serde(default)]
        password: Option<String>,
    },

    JoinGame {
        #[serde(rename = "gameId")]
        game_id: GameId,
        #[serde(default)]
        password: Option<String>,
    },

    LeaveGame,

    SubmitCards { cards: Vec<CardId> },

    /// Index into the submissions of the current round.
    SelectWinner { submission: usize },

    /// Lobby settings; absent fields stay unchanged. Host only.
    UpdateSettings {
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "maxPoints")]
        max_points: Option<u32>,
        #[serde(default)]
        decks: Option<Vec<DeckId>>,
    },

    StartGame,

    AdvanceRound,
}

/// A message sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum OutgoingMessage {
    /// The user record created for this connection.
    Connected(User),

    FullGamesList(Vec<RoomInfo>),

    RoomUpdate(RoomView),

    RoundUpdate(RoundView),

    /// The recipient's own hand.
    HandUpdate { cards: Vec<AnswerCard> },

    Error { message: String },
}

impl OutgoingMessage {
    pub fn error(message: impl Into<String>) -> Self {
        OutgoingMessage::Error {
            message: message.into(),
        }
    }
}

/// Public per-player state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: UserId,
    pub username: String,
    pub score: u32,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id(),
            username: player.user.username.clone(),
            score: player.score,
        }
    }
}

/// Everything a seated player may know about a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: GameId,
    pub name: String,
    pub phase: Phase,
    pub has_password: bool,
    pub max_points: u32,
    pub host: Option<UserId>,
    /// In seat order.
    pub players: Vec<PlayerView>,
    pub decks: Vec<DeckInfo>,
    /// Filled in once the game is over; several players on a tie.
    pub winners: Vec<UserId>,
}

impl From<&Game> for RoomView {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id(),
            name: game.name().to_string(),
            phase: game.phase(),
            has_password: game.has_password(),
            max_points: game.max_points(),
            host: game.host(),
            players: game.players().iter().map(PlayerView::from).collect(),
            decks: game.decks().iter().map(|d| DeckInfo::from(d.as_ref())).collect(),
            winners: if game.phase() == Phase::EndOfGame {
                game.winners()
            } else {
                Vec::new()
            },
        }
    }
}

/// One submission as shown to the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionView {
    /// Withheld until the czar has picked a winner.
    pub player: Option<UserId>,
    pub cards: Vec<AnswerCard>,
}

/// The current round as shown to the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub czar: UserId,
    pub question: QuestionCard,
    /// Players that have played this round, in seat order, without their cards.
    pub submitted: Vec<UserId>,
    /// Empty while cards are still being played.
    pub submissions: Vec<SubmissionView>,
    pub winner: Option<UserId>,
}

impl RoundView {
    pub fn from_game(game: &Game) -> Option<Self> {
        let round = game.round()?;
        let reveal_cards = matches!(game.phase(), Phase::WinnerSelection | Phase::EndOfRound)
            || round.is_resolved();
        let reveal_players = round.is_resolved();

        let submissions = if reveal_cards {
            round
                .submissions
                .iter()
                .map(|s| SubmissionView {
                    player: reveal_players.then_some(s.player),
                    cards: s.cards.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Some(Self {
            czar: round.czar,
            question: round.question.clone(),
            submitted: game
                .players()
                .iter()
                .map(|p| p.id())
                .filter(|id| round.has_submitted(*id))
                .collect(),
            submissions,
            winner: round.winner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tah_game::Deck;

    fn started_game() -> Game {
        let deck = Arc::new(Deck {
            id: DeckId(1),
            name: "Bark".into(),
            question_cards: vec![QuestionCard::new(1, "Why is the forest quiet? ____.", 1)],
            answer_cards: (0..40).map(|i| AnswerCard::new(i, format!("Answer {i}"))).collect(),
        });
        let mut game = Game::new(GameId(3), "Quiet Woods", Some("pw".into()))
            .unwrap()
            .with_decks(vec![deck]);
        for (id, name) in [(1, "alder"), (2, "aspen"), (3, "birch")] {
            game.add_player(User { id: UserId(id), username: name.into() }, Some("pw"))
                .unwrap();
        }
        game.set_max_points(3).unwrap();
        game.start().unwrap();
        game
    }

    fn play(game: &mut Game, user: u64) {
        let card = game.player(UserId(user)).unwrap().hand[0].id;
        game.submit_cards(UserId(user), &[card]).unwrap();
    }

    #[test]
    fn test_incoming_envelopes() {
        let msg: IncomingMessage =
            serde_json::from_value(json!({"type": "connect", "data": {"username": "alder"}}))
                .unwrap();
        assert_eq!(msg, IncomingMessage::Connect { username: "alder".into() });

        let msg: IncomingMessage = serde_json::from_value(json!({"type": "leaveGame"})).unwrap();
        assert_eq!(msg, IncomingMessage::LeaveGame);

        let msg: IncomingMessage =
            serde_json::from_value(json!({"type": "joinGame", "data": {"gameId": 4}})).unwrap();
        assert_eq!(msg, IncomingMessage::JoinGame { game_id: GameId(4), password: None });

        let msg: IncomingMessage = serde_json::from_value(
            json!({"type": "updateSettings", "data": {"maxPoints": 5, "decks": [1, 2]}}),
        )
        .unwrap();
        assert_eq!(
            msg,
            IncomingMessage::UpdateSettings {
                name: None,
                max_points: Some(5),
                decks: Some(vec![DeckId(1), DeckId(2)]),
            }
        );

        assert!(serde_json::from_value::<IncomingMessage>(json!({"type": "shout"})).is_err());
    }

    #[test]
    fn test_outgoing_envelopes() {
        let value = serde_json::to_value(OutgoingMessage::error("nope")).unwrap();
        assert_eq!(value, json!({"type": "error", "data": {"message": "nope"}}));

        let rooms = vec![RoomInfo { id: GameId(1), name: "Alpha".into() }];
        let value = serde_json::to_value(OutgoingMessage::FullGamesList(rooms)).unwrap();
        assert_eq!(value, json!({"type": "fullGamesList", "data": [{"id": 1, "name": "Alpha"}]}));
    }

    #[test]
    fn test_room_view_hides_password() {
        let game = started_game();
        let value =
            serde_json::to_value(OutgoingMessage::RoomUpdate(RoomView::from(&game))).unwrap();
        assert_eq!(value["type"], "roomUpdate");
        assert_eq!(value["data"]["phase"], "roundInProgress");
        assert_eq!(value["data"]["hasPassword"], true);
        assert_eq!(value["data"]["host"], 1);
        assert_eq!(value["data"]["players"].as_array().unwrap().len(), 3);
        assert!(!value.to_string().contains("\"pw\""));
    }

    #[test]
    fn test_round_view_reveals_in_stages() {
        let mut game = started_game();
        play(&mut game, 2);

        let view = RoundView::from_game(&game).unwrap();
        assert_eq!(view.czar, UserId(1));
        assert_eq!(view.submitted, vec![UserId(2)]);
        assert!(view.submissions.is_empty());

        play(&mut game, 3);
        assert_eq!(game.phase(), Phase::WinnerSelection);
        let view = RoundView::from_game(&game).unwrap();
        assert_eq!(view.submissions.len(), 2);
        assert!(view.submissions.iter().all(|s| s.player.is_none()));

        let picked = game.round().unwrap().submissions[1].player;
        game.select_winner(UserId(1), 1).unwrap();
        let view = RoundView::from_game(&game).unwrap();
        assert_eq!(view.winner, Some(picked));
        assert_eq!(view.submissions[1].player, Some(picked));
    }

    #[test]
    fn test_submitted_list_follows_seats() {
        let deck = Arc::new(Deck {
            id: DeckId(1),
            name: "Bark".into(),
            question_cards: vec![QuestionCard::new(1, "____ fell in the forest.", 1)],
            answer_cards: (0..60).map(|i| AnswerCard::new(i, format!("Answer {i}"))).collect(),
        });

        let mut orders = HashSet::new();
        for seed in 0..16 {
            let mut game = Game::new(GameId(4), "Loud Woods", None)
                .unwrap()
                .with_decks(vec![deck.clone()])
                .with_seed(seed);
            for id in 1..=4 {
                game.add_player(User { id: UserId(id), username: format!("tree{id}") }, None)
                    .unwrap();
            }
            game.set_max_points(3).unwrap();
            game.start().unwrap();

            play(&mut game, 4);
            let view = RoundView::from_game(&game).unwrap();
            assert_eq!(view.submitted, vec![UserId(4)]);
            play(&mut game, 2);
            play(&mut game, 3);

            let view = RoundView::from_game(&game).unwrap();
            assert_eq!(view.submitted, vec![UserId(2), UserId(3), UserId(4)]);

            // Authors of the shown cards, as only the server knows them.
            let authors: Vec<UserId> = game
                .round()
                .unwrap()
                .submissions
                .iter()
                .map(|s| s.player)
                .collect();
            let round = game.round().unwrap();
            for (shown, submission) in view.submissions.iter().zip(&round.submissions) {
                assert_eq!(shown.cards, submission.cards);
            }
            orders.insert(authors);
        }
        // Neither seat order nor arrival order pins down who played what.
        assert!(orders.len() > 1);
    }

    #[test]
    fn test_lobby_has_no_round_view() {
        let game = Game::new(GameId(1), "Empty Lot", None).unwrap();
        assert!(RoundView::from_game(&game).is_none());
    }
}
