//! Source decks available to new games.

use crate::cards::{Deck, DeckId, DeckInfo};
use crate::error::{DeckLoadError, GameError, GameResult};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Read-only collection of source decks, shared by every game.
#[derive(Debug, Clone, Default)]
pub struct DeckLibrary {
    decks: Vec<Arc<Deck>>,
}

impl DeckLibrary {
    pub fn new(decks: Vec<Deck>) -> Result<Self, DeckLoadError> {
        let mut seen = HashSet::new();
        for deck in &decks {
            if !seen.insert(deck.id) {
                return Err(DeckLoadError::DuplicateDeck(deck.id));
            }
        }
        Ok(Self {
            decks: decks.into_iter().map(Arc::new).collect(),
        })
    }

    /// Loads every `*.json` deck file in `dir`, in file name order.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, DeckLoadError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| DeckLoadError::Io(dir.to_path_buf(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| DeckLoadError::Io(dir.to_path_buf(), e))?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut decks = Vec::with_capacity(paths.len());
        for path in paths {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| DeckLoadError::Io(path.clone(), e))?;
            let deck: Deck = serde_json::from_str(&content)
                .map_err(|e| DeckLoadError::Parse(path.clone(), e))?;
            debug!(
                "Loaded deck {} '{}' from {} ({} questions, {} answers)",
                deck.id,
                deck.name,
                path.display(),
                deck.question_cards.len(),
                deck.answer_cards.len()
            );
            decks.push(deck);
        }

        let library = Self::new(decks)?;
        info!("📚 Loaded {} deck(s) from {}", library.len(), dir.display());
        Ok(library)
    }

    pub fn all(&self) -> Vec<Arc<Deck>> {
        self.decks.clone()
    }

    pub fn get(&self, id: DeckId) -> Option<Arc<Deck>> {
        self.decks.iter().find(|d| d.id == id).cloned()
    }

    /// Resolves a deck selection, failing on the first unknown id.
    pub fn select(&self, ids: &[DeckId]) -> GameResult<Vec<Arc<Deck>>> {
        ids.iter()
            .map(|id| self.get(*id).ok_or(GameError::UnknownDeck(*id)))
            .collect()
    }

    pub fn infos(&self) -> Vec<DeckInfo> {
        self.decks.iter().map(|d| DeckInfo::from(d.as_ref())).collect()
    }

    pub fn len(&self) -> usize {
        self.decks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const DECK_A: &str = r#"{
        "id": 1,
        "name": "Roots",
        "questionCards": [{"id": 1, "text": "____.", "numAnswers": 1}],
        "answerCards": [{"id": 1, "text": "Mycelium."}]
    }"#;
    const DECK_B: &str = r#"{
        "id": 2,
        "name": "Canopy",
        "answerCards": [{"id": 2, "text": "A startled squirrel."}]
    }"#;

    #[test]
    fn test_load_from_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.json"), DECK_B).unwrap();
        fs::write(dir.path().join("a.json"), DECK_A).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a deck").unwrap();

        let library = DeckLibrary::load_from_dir(dir.path()).unwrap();
        assert_eq!(library.len(), 2);
        let names: Vec<String> = library.infos().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Roots", "Canopy"]);
        assert!(library.get(DeckId(2)).unwrap().question_cards.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), DECK_A).unwrap();
        fs::write(dir.path().join("b.json"), DECK_A).unwrap();

        let err = DeckLibrary::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DeckLoadError::DuplicateDeck(DeckId(1))));
    }

    #[test]
    fn test_bad_json_names_the_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let err = DeckLibrary::load_from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_select() {
        let library = DeckLibrary::new(vec![serde_json::from_str(DECK_A).unwrap()]).unwrap();
        assert_eq!(library.select(&[DeckId(1)]).unwrap().len(), 1);
        assert_eq!(
            library.select(&[DeckId(1), DeckId(9)]).unwrap_err(),
            GameError::UnknownDeck(DeckId(9))
        );
    }
}
