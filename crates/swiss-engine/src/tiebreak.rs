//! Tie-break scores: Buchholz, Buchholz Cut-1 and average rating of opponents.
//!
//! Values are computed from the opponents' current points every time they are
//! asked for and never cached.

use crate::player::Player;
use swiss_core::{PlayerId, Points};

/// Tie-break columns for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TieBreaks {
    /// Sum of opponents' points.
    pub buchholz: Points,
    /// Buchholz without the weakest opponent.
    pub buchholz_cut1: Points,
    /// Average initial Elo of opponents, `None` without opponents.
    pub aro: Option<i32>,
}

/// Computes tie-breaks for `player` over its distinct real opponents.
///
/// `lookup` resolves opponent IDs; unknown opponents are skipped with a
/// warning.
pub fn compute<'a, F>(player: &Player, lookup: F) -> TieBreaks
where
    F: Fn(&PlayerId) -> Option<&'a Player>,
{
    let opponents: Vec<&Player> = player
        .opponents
        .iter()
        .filter_map(|id| {
            let opponent = lookup(id);
            if opponent.is_none() {
                tracing::warn!("Opponent {} of {} not found, skipped in tie-breaks", id, player.id);
            }
            opponent
        })
        .collect();

    if opponents.is_empty() {
        return TieBreaks::default();
    }

    let buchholz: Points = opponents.iter().map(|o| o.points).sum();
    let weakest = opponents
        .iter()
        .map(|o| o.points)
        .min()
        .unwrap_or(Points::ZERO);
    let total_elo: f64 = opponents.iter().map(|o| f64::from(o.initial_elo)).sum();

    TieBreaks {
        buchholz,
        buchholz_cut1: buchholz.saturating_sub(weakest),
        aro: Some((total_elo / opponents.len() as f64).round() as i32),
    }
}
