//! Game phases and their wire names.

use crate::error::PhaseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Where a game is in its lifecycle.
///
/// `Lobby -> RoundInProgress -> WinnerSelection -> EndOfRound -> {RoundInProgress | EndOfGame}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Lobby,
    RoundInProgress,
    WinnerSelection,
    EndOfRound,
    EndOfGame,
}

const PHASE_NAMES: [(Phase, &str); 5] = [
    (Phase::Lobby, "lobby"),
    (Phase::RoundInProgress, "roundInProgress"),
    (Phase::WinnerSelection, "winnerSelection"),
    (Phase::EndOfRound, "endOfRound"),
    (Phase::EndOfGame, "endOfGame"),
];

impl Phase {
    pub fn as_str(self) -> &'static str {
        PHASE_NAMES[self as usize].1
    }

    /// Whether the game has been started and not yet finished.
    pub fn is_running(self) -> bool {
        !matches!(self, Phase::Lobby | Phase::EndOfGame)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = PhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PHASE_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(phase, _)| *phase)
            .ok_or_else(|| PhaseError::InvalidPhase(s.to_string()))
    }
}

impl Serialize for Phase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Phase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(serde_json::to_string(&Phase::Lobby).unwrap(), r#""lobby""#);
        assert_eq!(
            serde_json::to_string(&Phase::WinnerSelection).unwrap(),
            r#""winnerSelection""#
        );
        let phase: Phase = serde_json::from_str(r#""endOfRound""#).unwrap();
        assert_eq!(phase, Phase::EndOfRound);
    }

    #[test]
    fn test_every_phase_parses_back() {
        for (phase, name) in PHASE_NAMES {
            assert_eq!(phase.as_str(), name);
            assert_eq!(name.parse::<Phase>().unwrap(), phase);
        }
    }

    #[test]
    fn test_unknown_phase_is_rejected() {
        assert_eq!(
            "Lobby".parse::<Phase>().unwrap_err(),
            PhaseError::InvalidPhase("Lobby".to_string())
        );
        let err = serde_json::from_str::<Phase>(r#""halftime""#).unwrap_err();
        assert!(err.to_string().contains("Invalid game phase"));
    }
}
