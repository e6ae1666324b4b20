//! Standings with tie-breaks, performance and projected rating change.
//!
//! The same ordering is used mid-tournament and at finalization:
//! points, Buchholz, performance and initial Elo, all descending. Player ID
//! breaks any remaining tie so the order is total.

use crate::player::Player;
use crate::rating::{self, RatedGame};
use crate::tiebreak::{self, TieBreaks};
use crate::tournament::Tournament;
use std::cmp::Reverse;
use swiss_core::{PlayerId, Points};

/// One line of the standings table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub rank: u32,
    pub id: PlayerId,
    pub name: String,
    pub initial_elo: i32,
    pub points: Points,
    pub tiebreaks: TieBreaks,
    pub performance: i32,
    pub elo_change: i32,
    pub k_factor: u32,
    pub rated_games: u32,
    pub withdrawn: bool,
}

/// Rated games of `player`, skipping opponents whose Elo is unknown.
pub fn rated_games(tournament: &Tournament, player: &Player) -> Vec<RatedGame> {
    player
        .rated_results()
        .filter_map(|entry| {
            let opponent = entry.opponent.as_ref()?;
            match tournament.player(opponent) {
                Some(found) => Some(RatedGame {
                    opponent_elo: found.initial_elo,
                    score: entry.score.as_f64(),
                }),
                None => {
                    tracing::warn!(
                        "No rating for {}'s round {} opponent {}, game skipped",
                        player.id,
                        entry.round,
                        opponent
                    );
                    None
                }
            }
        })
        .collect()
}

/// Computes the standings of every player, withdrawn ones included.
///
/// `default_k` stands in for players whose K-factor was not resolved.
pub fn compute(tournament: &Tournament, default_k: u32) -> Vec<Standing> {
    let mut table: Vec<Standing> = tournament
        .players
        .iter()
        .map(|player| {
            let games = rated_games(tournament, player);
            let k_factor = player.k_factor.unwrap_or(default_k);
            Standing {
                rank: 0,
                id: player.id.clone(),
                name: player.name.clone(),
                initial_elo: player.initial_elo,
                points: player.points,
                tiebreaks: tiebreak::compute(player, |id| tournament.player(id)),
                performance: rating::performance(player.initial_elo, &games),
                elo_change: rating::elo_change(k_factor, player.initial_elo, &games),
                k_factor,
                rated_games: games.len() as u32,
                withdrawn: player.withdrawn,
            }
        })
        .collect();

    table.sort_by_key(|s| {
        (
            Reverse(s.points),
            Reverse(s.tiebreaks.buchholz),
            Reverse(s.performance),
            Reverse(s.initial_elo),
            s.id.clone(),
        )
    });
    for (position, standing) in table.iter_mut().enumerate() {
        standing.rank = position as u32 + 1;
    }
    table
}
