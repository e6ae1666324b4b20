//! JSON persistence for the live tournament, the registry and the archive.
//!
//! Layout under the data directory:
//!
//! ```text
//! data/
//!   tournament.json        live slot, absent between tournaments
//!   players.json           career records
//!   archive/<id>.json      finalized tournaments
//! ```
//!
//! Every write goes to a temporary file in the target directory which is then
//! renamed over the destination, so a crash leaves either the old or the new
//! document.

use crate::registry::Registry;
use crate::tournament::Tournament;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        StorageError::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Atomically writes `value` as pretty JSON to `path`.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;

    let json = serde_json::to_vec_pretty(value).map_err(|e| StorageError::json(path, e))?;
    let mut file = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
    file.write_all(&json)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| StorageError::io(file.path(), e))?;
    file.persist(path)
        .map_err(|e| StorageError::io(path, e.error))?;
    Ok(())
}

/// Reads JSON from `path`; `Ok(None)` if the file does not exist.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::json(path, e))
}

/// File-backed store rooted at the data directory.
#[derive(Debug, Clone)]
pub struct TournamentStore {
    root: PathBuf,
}

impl TournamentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        TournamentStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tournament_path(&self) -> PathBuf {
        self.root.join("tournament.json")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join("players.json")
    }

    pub fn archive_path(&self, tournament_id: &str) -> PathBuf {
        self.root.join("archive").join(format!("{tournament_id}.json"))
    }

    /// Loads the live tournament and reconciles its cached player state.
    pub fn load_tournament(&self) -> Result<Option<Tournament>, StorageError> {
        let path = self.tournament_path();
        let Some(mut tournament) = load_json::<Tournament>(&path)? else {
            return Ok(None);
        };
        let corrected = tournament.reconcile();
        if corrected > 0 {
            tracing::warn!("Rebuilt state of {} players from {}", corrected, path.display());
        }
        Ok(Some(tournament))
    }

    pub fn save_tournament(&self, tournament: &Tournament) -> Result<(), StorageError> {
        save_json(&self.tournament_path(), tournament)
    }

    /// Empties the live slot.
    pub fn clear_tournament(&self) -> Result<(), StorageError> {
        let path = self.tournament_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    /// Writes a finalized tournament to the archive and empties the live slot.
    pub fn archive_tournament(&self, tournament: &Tournament) -> Result<PathBuf, StorageError> {
        let path = self.archive_path(&tournament.id);
        save_json(&path, tournament)?;
        self.clear_tournament()?;
        tracing::info!("Archived '{}' to {}", tournament.name, path.display());
        Ok(path)
    }

    /// Loads an archived tournament by ID.
    pub fn load_archived(&self, tournament_id: &str) -> Result<Option<Tournament>, StorageError> {
        let mut tournament = load_json::<Tournament>(&self.archive_path(tournament_id))?;
        if let Some(tournament) = tournament.as_mut() {
            tournament.reconcile();
        }
        Ok(tournament)
    }

    /// Loads the registry; a missing file is an empty registry.
    pub fn load_registry(&self) -> Result<Registry, StorageError> {
        Ok(load_json(&self.registry_path())?.unwrap_or_default())
    }

    pub fn save_registry(&self, registry: &Registry) -> Result<(), StorageError> {
        save_json(&self.registry_path(), registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::PairingOptions;
    use crate::player::Player;
    use crate::registry::NewPlayer;
    use chrono::NaiveDate;
    use swiss_core::{Outcome, PlayerId};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> Tournament {
        let mut tournament = Tournament::new("Stored", date("2025-04-01"), date("2025-04-02"), 2).unwrap();
        for (id, elo) in [("A", 1800), ("B", 1700), ("C", 1600)] {
            tournament
                .add_player(Player::new(PlayerId::from(id), id, elo))
                .unwrap();
        }
        tournament.start(|_| None, &PairingOptions::default()).unwrap();
        tournament
    }

    #[test]
    fn test_missing_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TournamentStore::new(dir.path());
        assert!(store.load_tournament().unwrap().is_none());
        assert!(store.load_registry().unwrap().is_empty());
    }

    #[test]
    fn test_tournament_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TournamentStore::new(dir.path().join("nested"));
        let mut tournament = sample();
        tournament.record_result(1, Outcome::Draw).unwrap();

        store.save_tournament(&tournament).unwrap();
        let loaded = store.load_tournament().unwrap().unwrap();

        assert_eq!(loaded.id, tournament.id);
        assert_eq!(loaded.players, tournament.players);
        assert_eq!(loaded.rounds, tournament.rounds);
        assert_eq!(loaded.next_match_id, tournament.next_match_id);
    }

    #[test]
    fn test_saved_json_uses_plain_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = TournamentStore::new(dir.path());
        store.save_tournament(&sample()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.tournament_path()).unwrap()).unwrap();
        assert_eq!(raw["start_date"], "2025-04-01");
        assert_eq!(raw["rounds"][0]["matches"][0]["outcome"], "PENDING");
        assert!(raw["players"][0]["points"].is_number());
    }

    #[test]
    fn test_archive_empties_live_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = TournamentStore::new(dir.path());
        let tournament = sample();
        store.save_tournament(&tournament).unwrap();

        let path = store.archive_tournament(&tournament).unwrap();

        assert!(path.exists());
        assert!(!store.tournament_path().exists());
        let archived = store.load_archived(&tournament.id).unwrap().unwrap();
        assert_eq!(archived.name, "Stored");
    }

    #[test]
    fn test_registry_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TournamentStore::new(dir.path());
        let mut registry = Registry::default();
        registry
            .register(NewPlayer::new("Tal", "Mikhail", 2700), date("2025-01-01"))
            .unwrap();

        store.save_registry(&registry).unwrap();

        assert_eq!(store.load_registry().unwrap(), registry);
    }

    #[test]
    fn test_corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TournamentStore::new(dir.path());
        std::fs::write(store.tournament_path(), "{ not json").unwrap();
        assert!(matches!(store.load_tournament(), Err(StorageError::Json { .. })));
    }
}
