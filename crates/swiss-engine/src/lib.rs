//! Swiss Engine - Swiss-system chess tournaments.
//!
//! This crate pairs rounds under FIDE Dutch-style constraints, keeps the
//! result ledger, computes standings with tie-breaks and applies rating
//! changes to the player registry when a tournament finishes.
//!
//! # Modules
//!
//! - [`rating`] - Expected score, Elo change, performance and K-factor
//! - [`tiebreak`] - Buchholz, Buchholz Cut-1 and ARO
//! - [`colors`] - Color allocation for a candidate pair
//! - [`pairing`] - Score-group pairing with fallback passes
//! - [`tournament`] - The tournament state machine, with result entry in
//!   [`ledger`] and closing in [`finalize`]
//! - [`standings`] - Ranked standings tables
//! - [`registry`] - Persistent career records
//! - [`schedule`] - Round windows over the tournament span
//! - [`storage`] - Atomic JSON persistence
//! - [`report`] - Plain-text pairings, standings and schedule
//! - [`director`] - Orchestration against storage
//! - [`config`] - `swiss.toml` loading

pub mod colors;
pub mod config;
pub mod director;
pub mod finalize;
pub mod ledger;
pub mod pairing;
pub mod player;
pub mod rating;
pub mod registry;
pub mod report;
pub mod schedule;
pub mod standings;
pub mod storage;
pub mod tiebreak;
pub mod tournament;

pub use config::{ConfigError, SwissConfig};
pub use director::{Advance, Director, DirectorError, TournamentSetup};
pub use pairing::{PairingError, PairingOptions};
pub use player::Player;
pub use registry::{CareerRecord, NewPlayer, Registry, RegistryError, Sex};
pub use standings::Standing;
pub use storage::{StorageError, TournamentStore};
pub use tournament::{Match, Round, Status, Tournament, TournamentError};
