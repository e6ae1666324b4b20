//! Persistent career records.
//!
//! The registry is the only state that outlives a tournament. Tournament code
//! reads it when the tournament starts (K-factor) and writes it once, at
//! finalization.

use crate::rating::{self, RatingProfile};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use swiss_core::{PlayerId, PlayerIdError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Id(#[from] PlayerIdError),
    #[error("federation must be a 3-letter code, got '{0}'")]
    InvalidFederation(String),
    #[error("FIDE ID must be digits, got '{0}'")]
    InvalidFideId(String),
    #[error("Elo must be positive, got {0}")]
    InvalidElo(i32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[default]
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "w")]
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sex::Male => "m",
            Sex::Female => "w",
        })
    }
}

/// Medal counters. Rank 4 earns the wooden medal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medals {
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub silver: u32,
    #[serde(default)]
    pub bronze: u32,
    #[serde(default)]
    pub wood: u32,
}

impl Medals {
    /// Increments the counter for `rank`, if it has one.
    pub fn award(&mut self, rank: u32) {
        match rank {
            1 => self.gold += 1,
            2 => self.silver += 1,
            3 => self.bronze += 1,
            4 => self.wood += 1,
            _ => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.gold + self.silver + self.bronze
    }
}

/// One finished tournament in a career.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentEntry {
    pub tournament_id: String,
    pub name: String,
    pub rank: u32,
    pub total_players: u32,
    pub completed_on: NaiveDate,
    pub started_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerRecord {
    pub id: PlayerId,
    pub given_name: String,
    pub family_name: String,
    pub elo: i32,
    pub registered_on: NaiveDate,
    /// Lifetime rated games.
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub medals: Medals,
    #[serde(default)]
    pub tournaments: Vec<TournamentEntry>,
    #[serde(default)]
    pub experienced: bool,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sex: Sex,
    pub federation: String,
    #[serde(default = "unknown_fide_id")]
    pub fide_id: String,
}

fn unknown_fide_id() -> String {
    "0".to_string()
}

impl CareerRecord {
    /// "Family, Given" as shown in reports.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.family_name, self.given_name)
    }

    pub fn rating_profile(&self) -> RatingProfile {
        RatingProfile {
            elo: self.elo,
            games_played: self.games_played,
            experienced: self.experienced,
            birth_date: self.birth_date,
        }
    }
}

/// Data needed to register a newcomer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub family_name: String,
    pub given_name: String,
    pub elo: i32,
    pub birth_date: Option<NaiveDate>,
    pub sex: Sex,
    pub federation: String,
    pub title: Option<String>,
    pub fide_id: Option<String>,
}

impl NewPlayer {
    /// A newcomer with no optional data and the FIDE federation code.
    pub fn new(family_name: impl Into<String>, given_name: impl Into<String>, elo: i32) -> Self {
        NewPlayer {
            family_name: family_name.into(),
            given_name: given_name.into(),
            elo,
            birth_date: None,
            sex: Sex::default(),
            federation: "FID".to_string(),
            title: None,
            fide_id: None,
        }
    }
}

/// All career records, serialized as a plain list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    records: Vec<CareerRecord>,
}

impl Registry {
    pub fn get(&self, id: &PlayerId) -> Option<&CareerRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    fn get_mut(&mut self, id: &PlayerId) -> Option<&mut CareerRecord> {
        self.records.iter_mut().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn records(&self) -> &[CareerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Creates a career record with a fresh ID and returns that ID.
    ///
    /// # Errors
    ///
    /// Fails on empty names, an exhausted ID prefix, a malformed federation or
    /// FIDE ID, or a non-positive Elo.
    pub fn register(&mut self, new: NewPlayer, today: NaiveDate) -> Result<PlayerId, RegistryError> {
        if new.elo <= 0 {
            return Err(RegistryError::InvalidElo(new.elo));
        }
        let federation = new.federation.trim().to_uppercase();
        if federation.len() != 3 || !federation.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RegistryError::InvalidFederation(new.federation));
        }
        let fide_id = new.fide_id.unwrap_or_else(unknown_fide_id);
        if fide_id.is_empty() || !fide_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(RegistryError::InvalidFideId(fide_id));
        }
        let id = PlayerId::generate(&new.family_name, &new.given_name, |candidate| {
            self.contains(candidate)
        })?;

        tracing::info!("Registered {} as {}", new.family_name, id);
        self.records.push(CareerRecord {
            id: id.clone(),
            given_name: new.given_name.trim().to_string(),
            family_name: new.family_name.trim().to_string(),
            elo: new.elo,
            registered_on: today,
            games_played: 0,
            medals: Medals::default(),
            tournaments: Vec::new(),
            experienced: false,
            birth_date: new.birth_date,
            title: new.title,
            sex: new.sex,
            federation,
            fide_id,
        });
        Ok(id)
    }

    /// K-factor for `id` as of `on`, or `None` without a record.
    pub fn k_factor(&self, id: &PlayerId, on: NaiveDate) -> Option<u32> {
        self.get(id)
            .map(|record| rating::k_factor(&record.rating_profile(), on))
    }

    /// Applies one tournament's outcome to a career. Returns `false` when the
    /// player has no record.
    pub fn record_finish(
        &mut self,
        id: &PlayerId,
        elo_change: i32,
        rated_games: u32,
        entry: TournamentEntry,
    ) -> bool {
        let Some(record) = self.get_mut(id) else {
            return false;
        };
        record.elo += elo_change;
        record.games_played += rated_games;
        record.medals.award(entry.rank);
        record.tournaments.push(entry);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn register_assigns_sequential_ids() {
        let mut registry = Registry::default();
        let today = date("2025-03-01");
        let first = registry
            .register(NewPlayer::new("Carlsen", "Magnus", 2830), today)
            .unwrap();
        let second = registry
            .register(NewPlayer::new("Carter", "Maria", 1500), today)
            .unwrap();

        assert_eq!(first.as_str(), "CARMA001");
        assert_eq!(second.as_str(), "CARMA002");
        let record = registry.get(&first).unwrap();
        assert_eq!(record.registered_on, today);
        assert_eq!(record.games_played, 0);
        assert_eq!(record.medals, Medals::default());
        assert!(!record.experienced);
        assert_eq!(record.fide_id, "0");
        assert_eq!(record.display_name(), "Carlsen, Magnus");
    }

    #[test]
    fn register_validates_fields() {
        let mut registry = Registry::default();
        let today = date("2025-03-01");

        let mut bad_fed = NewPlayer::new("Doe", "Jane", 1500);
        bad_fed.federation = "NL".to_string();
        assert!(matches!(
            registry.register(bad_fed, today),
            Err(RegistryError::InvalidFederation(_))
        ));

        let mut bad_fide = NewPlayer::new("Doe", "Jane", 1500);
        bad_fide.fide_id = Some("12a".to_string());
        assert!(matches!(
            registry.register(bad_fide, today),
            Err(RegistryError::InvalidFideId(_))
        ));

        assert_eq!(
            registry.register(NewPlayer::new("Doe", "Jane", 0), today),
            Err(RegistryError::InvalidElo(0))
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn k_factor_uses_career_data() {
        let mut registry = Registry::default();
        let mut junior = NewPlayer::new("Young", "Tim", 1900);
        junior.birth_date = Some(date("2010-06-01"));
        let id = registry.register(junior, date("2024-01-01")).unwrap();

        // Newcomers have fewer than 30 games.
        assert_eq!(registry.k_factor(&id, date("2025-04-01")), Some(40));
        assert_eq!(registry.k_factor(&PlayerId::from("NOBODY"), date("2025-04-01")), None);
    }

    #[test]
    fn record_finish_updates_career() {
        let mut registry = Registry::default();
        let id = registry
            .register(NewPlayer::new("Polgar", "Judit", 2600), date("2025-01-01"))
            .unwrap();
        let entry = TournamentEntry {
            tournament_id: "t1".to_string(),
            name: "Spring Open".to_string(),
            rank: 4,
            total_players: 8,
            completed_on: date("2025-04-03"),
            started_on: date("2025-04-01"),
        };

        assert!(registry.record_finish(&id, -7, 5, entry.clone()));

        let record = registry.get(&id).unwrap();
        assert_eq!(record.elo, 2593);
        assert_eq!(record.games_played, 5);
        assert_eq!(record.medals.wood, 1);
        assert_eq!(record.medals.total(), 0);
        assert_eq!(record.tournaments, vec![entry.clone()]);
        assert!(!registry.record_finish(&PlayerId::from("GHOST"), 10, 1, entry));
    }

    #[test]
    fn registry_serializes_as_list() {
        let json = r#"[{"id":"DOEJA001","given_name":"Jane","family_name":"Doe","elo":1500,
            "registered_on":"2025-01-01","federation":"USA","sex":"w"}]"#;
        let registry: Registry = serde_json::from_str(json).unwrap();
        let record = registry.get(&PlayerId::from("DOEJA001")).unwrap();
        assert_eq!(record.sex, Sex::Female);
        assert_eq!(record.fide_id, "0");
        assert!(record.tournaments.is_empty());
    }
}
