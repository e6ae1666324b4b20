//! Drives the tournament state machine against storage.
//!
//! Every operation mutates the in-memory state, then persists it. When the
//! write fails the pre-operation snapshot is restored and the storage error
//! is returned, so memory never runs ahead of disk.

use crate::config::SwissConfig;
use crate::pairing::{PairingError, PairingOptions};
use crate::player::Player;
use crate::registry::{NewPlayer, Registry, RegistryError};
use crate::standings::{self, Standing};
use crate::storage::{StorageError, TournamentStore};
use crate::tournament::{Status, Tournament, TournamentError};
use chrono::NaiveDate;
use std::path::PathBuf;
use swiss_core::{Outcome, PlayerId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectorError {
    #[error(transparent)]
    Tournament(#[from] TournamentError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("no tournament is running")]
    NoTournament,
    #[error("tournament '{0}' is still running")]
    TournamentRunning(String),
    #[error("player {0} is not in the registry")]
    Unregistered(PlayerId),
}

/// Everything needed to start a tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentSetup {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rounds: u32,
    /// Registry IDs of the entrants.
    pub players: Vec<PlayerId>,
}

/// What happened after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The current round still has games without a result.
    Pending { round: u32, remaining: usize },
    /// The next round was paired.
    Paired { round: u32 },
    /// The last round finished; the tournament was finalized and archived.
    Finalized {
        standings: Vec<Standing>,
        archive: PathBuf,
    },
    /// The completed round could not be paired onward; the tournament waits
    /// for a withdrawal or `advance_with` relaxed options.
    Blocked { round: u32, error: PairingError },
}

pub struct Director {
    config: SwissConfig,
    store: TournamentStore,
    registry: Registry,
    tournament: Option<Tournament>,
}

impl Director {
    /// Loads the registry and the live tournament from `config.data_dir`.
    ///
    /// The launch counter is bumped and persisted. A round that was completed
    /// but never advanced is advanced now; the outcome is returned alongside.
    /// If that round still cannot be paired the director opens anyway and
    /// reports `Advance::Blocked`.
    pub fn open(config: SwissConfig) -> Result<(Self, Option<Advance>), DirectorError> {
        let store = TournamentStore::new(&config.data_dir);
        let registry = store.load_registry()?;
        let tournament = store.load_tournament()?;
        let mut director = Director {
            config,
            store,
            registry,
            tournament,
        };

        let Some(tournament) = director.tournament.as_mut() else {
            tracing::info!("No live tournament in {}", director.store.root().display());
            return Ok((director, None));
        };
        tournament.launch_count += 1;
        tracing::info!(
            "Resumed '{}' (launch {}), round {} of {}",
            tournament.name,
            tournament.launch_count,
            tournament.current_round,
            tournament.total_rounds
        );
        director.store.save_tournament(tournament)?;

        let status = director.current()?.status();
        let resumed = match status {
            Status::RoundComplete { .. } => match director.advance() {
                Ok(advance) => Some(advance),
                Err(DirectorError::Tournament(TournamentError::Pairing { round, source })) => {
                    tracing::warn!("Round {} still cannot be paired: {}", round, source);
                    Some(Advance::Blocked { round, error: source })
                }
                Err(e) => return Err(e),
            },
            _ => None,
        };
        Ok((director, resumed))
    }

    pub fn config(&self) -> &SwissConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn tournament(&self) -> Option<&Tournament> {
        self.tournament.as_ref()
    }

    fn current(&self) -> Result<&Tournament, DirectorError> {
        self.tournament.as_ref().ok_or(DirectorError::NoTournament)
    }

    /// Standings of the live tournament as of now.
    pub fn standings(&self) -> Result<Vec<Standing>, DirectorError> {
        Ok(standings::compute(self.current()?, self.config.rating.default_k_factor))
    }

    /// Adds a career record and persists the registry.
    pub fn register_player(&mut self, new: NewPlayer) -> Result<PlayerId, DirectorError> {
        let snapshot = self.registry.clone();
        let id = self.registry.register(new, today())?;
        if let Err(e) = self.store.save_registry(&self.registry) {
            self.registry = snapshot;
            return Err(e.into());
        }
        Ok(id)
    }

    /// Creates a tournament from registry players and pairs round 1.
    ///
    /// Initial Elo and K-factor come from each career record as of the start
    /// date.
    pub fn create_tournament(&mut self, setup: TournamentSetup) -> Result<&Tournament, DirectorError> {
        if let Some(live) = &self.tournament {
            return Err(DirectorError::TournamentRunning(live.name.clone()));
        }
        let mut tournament =
            Tournament::new(setup.name, setup.start_date, setup.end_date, setup.rounds)?;
        for id in &setup.players {
            let record = self
                .registry
                .get(id)
                .ok_or_else(|| DirectorError::Unregistered(id.clone()))?;
            tournament.add_player(Player::new(id.clone(), record.display_name(), record.elo))?;
        }
        let registry = &self.registry;
        tournament.start(
            |id| registry.k_factor(id, setup.start_date),
            &self.config.pairing,
        )?;

        self.store.save_tournament(&tournament)?;
        tracing::info!("Created tournament '{}' ({})", tournament.name, tournament.id);
        Ok(&*self.tournament.insert(tournament))
    }

    /// Records a result, persists it and advances if the round is complete.
    ///
    /// A failure to pair the next round is returned as an error after the
    /// result itself has been saved.
    pub fn record_result(&mut self, match_id: u32, outcome: Outcome) -> Result<Advance, DirectorError> {
        self.mutate(|t| t.record_result(match_id, outcome).map_err(Into::into))?;
        self.advance()
    }

    /// Cancels a recorded result of the current round.
    pub fn cancel_result(&mut self, match_id: u32) -> Result<Outcome, DirectorError> {
        self.mutate(|t| t.cancel_result(match_id).map_err(Into::into))
    }

    /// Withdraws a player from all later rounds.
    pub fn withdraw(&mut self, id: &PlayerId) -> Result<Advance, DirectorError> {
        self.mutate(|t| t.withdraw(id).map_err(Into::into))?;
        self.advance()
    }

    /// Performs the pending transition with the configured pairing options.
    pub fn advance(&mut self) -> Result<Advance, DirectorError> {
        let options = self.config.pairing.clone();
        self.advance_with(&options)
    }

    /// Performs the pending transition: pairs the next round, finalizes, or
    /// reports what is still pending.
    pub fn advance_with(&mut self, options: &PairingOptions) -> Result<Advance, DirectorError> {
        let tournament = self.current()?;
        let completed = match tournament.status() {
            Status::InProgress { round } => {
                let remaining = tournament.round(round).map_or(0, |r| r.pending());
                return Ok(Advance::Pending { round, remaining });
            }
            Status::Setup => return Err(TournamentError::NotStarted.into()),
            Status::Finalized => return Err(TournamentError::Finalized.into()),
            Status::RoundComplete { round } => round,
        };

        if completed < tournament.total_rounds {
            let round = self.mutate(|t| t.pair_next_round(options).map_err(Into::into))?;
            return Ok(Advance::Paired { round });
        }
        self.finalize()
    }

    fn finalize(&mut self) -> Result<Advance, DirectorError> {
        let default_k = self.config.rating.default_k_factor;
        let registry_snapshot = self.registry.clone();
        let Some(mut tournament) = self.tournament.take() else {
            return Err(DirectorError::NoTournament);
        };
        let tournament_snapshot = tournament.clone();

        let outcome = tournament
            .finalize(&mut self.registry, default_k, today())
            .map_err(DirectorError::from)
            .and_then(|table| {
                let archive = self.store.archive_path(&tournament.id);
                crate::storage::save_json(&archive, &tournament)?;
                self.store.save_registry(&self.registry)?;
                self.store.clear_tournament()?;
                Ok(Advance::Finalized {
                    standings: table,
                    archive,
                })
            });

        match outcome {
            Ok(advance) => {
                tracing::info!("'{}' archived, live slot cleared", tournament.name);
                Ok(advance)
            }
            Err(e) => {
                if self.registry != registry_snapshot {
                    self.registry = registry_snapshot;
                    if let Err(restore) = self.store.save_registry(&self.registry) {
                        tracing::warn!("Could not restore the registry file: {}", restore);
                    }
                }
                self.tournament = Some(tournament_snapshot);
                Err(e)
            }
        }
    }

    /// Applies `change` to the live tournament and persists it, restoring the
    /// previous state if either step fails.
    fn mutate<T>(
        &mut self,
        change: impl FnOnce(&mut Tournament) -> Result<T, DirectorError>,
    ) -> Result<T, DirectorError> {
        let tournament = self.tournament.as_mut().ok_or(DirectorError::NoTournament)?;
        let snapshot = tournament.clone();
        let value = change(tournament)?;
        if let Err(e) = self.store.save_tournament(tournament) {
            *tournament = snapshot;
            return Err(e.into());
        }
        Ok(value)
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path) -> SwissConfig {
        SwissConfig {
            data_dir: dir.to_path_buf(),
            ..SwissConfig::default()
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn setup(director: &mut Director, rounds: u32) -> Vec<PlayerId> {
        let ids: Vec<PlayerId> = [("Adams", 1800), ("Byrne", 1700), ("Carlsen", 1600), ("Dubov", 1500)]
            .into_iter()
            .map(|(family, elo)| director.register_player(NewPlayer::new(family, "Test", elo)).unwrap())
            .collect();
        director
            .create_tournament(TournamentSetup {
                name: "Director Cup".to_string(),
                start_date: date("2025-04-01"),
                end_date: date("2025-04-03"),
                rounds,
                players: ids.clone(),
            })
            .unwrap();
        ids
    }

    fn play_round(director: &mut Director) -> Advance {
        let ids: Vec<u32> = director
            .tournament()
            .unwrap()
            .current()
            .unwrap()
            .matches
            .iter()
            .filter(|m| m.outcome.is_pending())
            .map(|m| m.id)
            .collect();
        let mut last = None;
        for id in ids {
            last = Some(director.record_result(id, Outcome::WhiteWins).unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn test_open_empty_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (director, resumed) = Director::open(config(dir.path())).unwrap();
        assert!(director.tournament().is_none());
        assert!(director.registry().is_empty());
        assert!(resumed.is_none());
    }

    #[test]
    fn test_create_requires_registered_players() {
        let dir = tempfile::tempdir().unwrap();
        let (mut director, _) = Director::open(config(dir.path())).unwrap();
        let result = director.create_tournament(TournamentSetup {
            name: "Ghosts".to_string(),
            start_date: date("2025-04-01"),
            end_date: date("2025-04-01"),
            rounds: 1,
            players: vec![PlayerId::from("GHOST001")],
        });
        assert!(matches!(result, Err(DirectorError::Unregistered(_))));
        assert!(director.tournament().is_none());
    }

    #[test]
    fn test_result_advances_round() {
        let dir = tempfile::tempdir().unwrap();
        let (mut director, _) = Director::open(config(dir.path())).unwrap();
        setup(&mut director, 2);

        let first = director.record_result(1, Outcome::Draw).unwrap();
        assert_eq!(first, Advance::Pending { round: 1, remaining: 1 });
        let second = director.record_result(2, Outcome::WhiteWins).unwrap();
        assert_eq!(second, Advance::Paired { round: 2 });

        let tournament = director.tournament().unwrap();
        assert_eq!(tournament.current_round, 2);
        assert!(tournament.players.iter().all(|p| p.k_factor == Some(40)));
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (mut director, _) = Director::open(config(dir.path())).unwrap();
        setup(&mut director, 3);
        director.record_result(1, Outcome::BlackWins).unwrap();
        let before = director.tournament().unwrap().players.clone();
        drop(director);

        let (reopened, resumed) = Director::open(config(dir.path())).unwrap();
        let tournament = reopened.tournament().unwrap();
        assert!(resumed.is_none());
        assert_eq!(tournament.players, before);
        assert_eq!(tournament.launch_count, 1);
        assert_eq!(reopened.registry().len(), 4);
    }

    #[test]
    fn test_reopen_after_unpairable_round() {
        let dir = tempfile::tempdir().unwrap();
        let mut strict = config(dir.path());
        strict.pairing.allow_forced_repeats = false;
        let (mut director, _) = Director::open(strict.clone()).unwrap();
        let ids: Vec<PlayerId> = [("Adams", 1800), ("Byrne", 1700)]
            .into_iter()
            .map(|(family, elo)| director.register_player(NewPlayer::new(family, "Test", elo)).unwrap())
            .collect();
        director
            .create_tournament(TournamentSetup {
                name: "Duel".to_string(),
                start_date: date("2025-04-01"),
                end_date: date("2025-04-02"),
                rounds: 2,
                players: ids,
            })
            .unwrap();

        let result = director.record_result(1, Outcome::WhiteWins);
        assert!(matches!(
            result,
            Err(DirectorError::Tournament(TournamentError::Pairing { round: 2, .. }))
        ));
        drop(director);

        let (mut reopened, resumed) = Director::open(strict).unwrap();
        assert!(matches!(resumed, Some(Advance::Blocked { round: 2, .. })));
        let tournament = reopened.tournament().unwrap();
        assert_eq!(tournament.status(), Status::RoundComplete { round: 1 });
        assert_eq!(tournament.launch_count, 1);

        let relaxed = PairingOptions {
            allow_forced_repeats: true,
        };
        assert_eq!(reopened.advance_with(&relaxed).unwrap(), Advance::Paired { round: 2 });
        let round = reopened.tournament().unwrap().current().unwrap();
        assert!(round.matches[0].forced_repeat);
    }

    #[test]
    fn test_reopen_pairs_completed_round() {
        let dir = tempfile::tempdir().unwrap();
        let (mut director, _) = Director::open(config(dir.path())).unwrap();
        setup(&mut director, 2);
        director.record_result(1, Outcome::WhiteWins).unwrap();
        director.record_result(2, Outcome::WhiteWins).unwrap();
        drop(director);

        // Roll the live file back to the completed but unpaired round.
        let path = dir.path().join("tournament.json");
        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        json["rounds"].as_array_mut().unwrap().pop();
        std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

        let (reopened, resumed) = Director::open(config(dir.path())).unwrap();
        assert_eq!(resumed, Some(Advance::Paired { round: 2 }));
        assert_eq!(reopened.tournament().unwrap().current_round, 2);
    }

    #[test]
    fn test_create_rejects_second_tournament() {
        let dir = tempfile::tempdir().unwrap();
        let (mut director, _) = Director::open(config(dir.path())).unwrap();
        let ids = setup(&mut director, 1);
        let result = director.create_tournament(TournamentSetup {
            name: "Second".to_string(),
            start_date: date("2025-05-01"),
            end_date: date("2025-05-01"),
            rounds: 1,
            players: ids,
        });
        assert!(matches!(result, Err(DirectorError::TournamentRunning(_))));
    }

    #[test]
    fn test_last_round_finalizes_and_archives() {
        let dir = tempfile::tempdir().unwrap();
        let (mut director, _) = Director::open(config(dir.path())).unwrap();
        setup(&mut director, 2);
        let tournament_id = director.tournament().unwrap().id.clone();

        assert_eq!(play_round(&mut director), Advance::Paired { round: 2 });
        let Advance::Finalized { standings, archive } = play_round(&mut director) else {
            panic!("expected finalization");
        };

        assert_eq!(standings.len(), 4);
        assert!(archive.ends_with(format!("{tournament_id}.json")));
        assert!(archive.exists());
        assert!(director.tournament().is_none());
        assert!(!dir.path().join("tournament.json").exists());

        let champion = director.registry().get(&standings[0].id).unwrap();
        assert_eq!(champion.medals.gold, 1);
        assert_eq!(champion.games_played, 2);
        assert_eq!(champion.tournaments[0].tournament_id, tournament_id);
    }

    #[test]
    fn test_cancel_then_record_again() {
        let dir = tempfile::tempdir().unwrap();
        let (mut director, _) = Director::open(config(dir.path())).unwrap();
        setup(&mut director, 2);
        director.record_result(1, Outcome::WhiteWins).unwrap();
        assert_eq!(director.cancel_result(1).unwrap(), Outcome::WhiteWins);
        assert!(matches!(
            director.cancel_result(1),
            Err(DirectorError::Tournament(TournamentError::NotDecided(1)))
        ));
        director.record_result(1, Outcome::Draw).unwrap();
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let (mut director, _) = Director::open(config(dir.path())).unwrap();
        setup(&mut director, 2);
        let before = director.tournament().unwrap().players.clone();

        // A directory in place of the live file makes the rename fail.
        std::fs::remove_file(dir.path().join("tournament.json")).unwrap();
        std::fs::create_dir(dir.path().join("tournament.json")).unwrap();

        let result = director.record_result(1, Outcome::WhiteWins);

        assert!(matches!(result, Err(DirectorError::Storage(_))));
        let tournament = director.tournament().unwrap();
        assert_eq!(tournament.players, before);
        assert!(tournament.find_match(1).unwrap().outcome.is_pending());
    }
}
