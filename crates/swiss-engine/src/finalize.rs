//! Closing a tournament.
//!
//! Finalization freezes the standings into the players' derived fields and
//! writes the outcome to the registry. It runs once; afterwards the
//! tournament is read-only.

use crate::registry::{Registry, TournamentEntry};
use crate::standings::{self, Standing};
use crate::tournament::{Status, Tournament, TournamentError};
use chrono::NaiveDate;

impl Tournament {
    /// Finalizes a tournament whose last round is complete.
    ///
    /// K-factors are resolved against `registry` as of the start date, falling
    /// back to the value snapshotted at start and then to `default_k`. Players
    /// without a career record get no registry update.
    ///
    /// # Errors
    ///
    /// Fails unless every round has been paired and decided.
    pub fn finalize(
        &mut self,
        registry: &mut Registry,
        default_k: u32,
        completed_on: NaiveDate,
    ) -> Result<Vec<Standing>, TournamentError> {
        match self.status() {
            Status::Setup => return Err(TournamentError::NotStarted),
            Status::Finalized => return Err(TournamentError::Finalized),
            Status::InProgress { round } => return Err(TournamentError::RoundIncomplete(round)),
            Status::RoundComplete { round } if round < self.total_rounds => {
                return Err(TournamentError::RoundsRemaining {
                    played: round,
                    total: self.total_rounds,
                })
            }
            Status::RoundComplete { .. } => {}
        }

        let start = self.start_date;
        for player in &mut self.players {
            let resolved = registry.k_factor(&player.id, start).or(player.k_factor);
            if resolved.is_none() {
                tracing::warn!("No career data for {}, K-factor defaults to {}", player.id, default_k);
            }
            player.k_factor = Some(resolved.unwrap_or(default_k));
        }

        let table = standings::compute(self, default_k);
        let total_players = table.len() as u32;
        for standing in &table {
            if let Some(player) = self.player_mut(&standing.id) {
                player.buchholz = Some(standing.tiebreaks.buchholz);
                player.performance = Some(standing.performance);
                player.elo_change = Some(standing.elo_change);
                player.rank = Some(standing.rank);
            }
            let entry = TournamentEntry {
                tournament_id: self.id.clone(),
                name: self.name.clone(),
                rank: standing.rank,
                total_players,
                completed_on,
                started_on: start,
            };
            if !registry.record_finish(&standing.id, standing.elo_change, standing.rated_games, entry) {
                tracing::warn!("{} has no career record, registry not updated", standing.id);
            }
        }

        self.completed_on = Some(completed_on);
        tracing::info!("Tournament '{}' finalized, {} players ranked", self.name, total_players);
        Ok(table)
    }
}
