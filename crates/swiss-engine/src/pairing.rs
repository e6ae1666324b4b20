//! Swiss pairing engine.
//!
//! Produces one round of boards from the current player state. The main pass
//! is a Dutch-style fold inside score groups: each group (with any players
//! carried down from above at its head) is split in half and the top half is
//! paired against the bottom half in reverse, so the best seed meets the
//! weakest. Illegal candidates are replaced by probing outward through the
//! bottom half. Whoever stays unpaired drops into the next group.
//!
//! Players still unpaired after the last group go through two fallback
//! passes: Pass A pairs them without repeats, Pass B (if enabled) allows
//! repeated opponents as a last resort and marks those boards as forced.
//! Color legality is enforced everywhere.

use crate::colors::{self, ColorAssignment};
use crate::player::Player;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use swiss_core::{Color, PlayerId};
use thiserror::Error;

/// Upper bound on search steps for the fallback matcher.
const SEARCH_BUDGET: usize = 100_000;

/// Errors that can occur while pairing a round.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PairingError {
    /// No complete pairing exists under the active constraints.
    #[error("no legal pairing for {}", format_ids(.unpaired))]
    Infeasible { unpaired: Vec<PlayerId> },
}

fn format_ids(ids: &[PlayerId]) -> String {
    ids.iter()
        .map(PlayerId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tunables for the pairing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingOptions {
    /// Enables fallback Pass B, which may pair players a second time.
    #[serde(default = "default_allow_forced_repeats")]
    pub allow_forced_repeats: bool,
}

fn default_allow_forced_repeats() -> bool {
    true
}

impl Default for PairingOptions {
    fn default() -> Self {
        PairingOptions {
            allow_forced_repeats: default_allow_forced_repeats(),
        }
    }
}

/// One board of a paired round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub white: PlayerId,
    pub black: PlayerId,
    /// The players have met before; produced only by Pass B.
    pub forced_repeat: bool,
}

/// The outcome of pairing a round, ready to be committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundPairing {
    /// Boards in display order.
    pub boards: Vec<Board>,
    pub bye: Option<PlayerId>,
    /// The bye went to a player who already had one.
    pub bye_reassigned: bool,
    /// Players paired against someone from a lower score group.
    pub floaters: Vec<PlayerId>,
    /// Pass B was needed.
    pub degraded: bool,
}

type Pair<'a> = (&'a Player, &'a Player);

/// Pairs round `round` for `players`.
///
/// Withdrawn players are left out. With an odd number of active players one
/// of them is chosen for the bye.
///
/// # Errors
///
/// Returns [`PairingError::Infeasible`] if no complete pairing exists even
/// after both fallback passes (or after Pass A when forced repeats are
/// disabled).
pub fn pair_round(
    players: &[Player],
    round: u32,
    options: &PairingOptions,
) -> Result<RoundPairing, PairingError> {
    let mut active: Vec<&Player> = players.iter().filter(|p| p.is_active()).collect();
    active.sort_by(|a, b| seed_order(a, b));

    let mut pairing = RoundPairing::default();
    if active.len() % 2 == 1 {
        let (index, reassigned) = select_bye(&active);
        let player = active.remove(index);
        if reassigned {
            tracing::warn!(
                "Round {}: every active player already had a bye, {} receives another",
                round,
                player.id
            );
        }
        pairing.bye = Some(player.id.clone());
        pairing.bye_reassigned = reassigned;
    }

    let (mut pairs, leftovers) = main_pass(&active);

    if !leftovers.is_empty() {
        tracing::info!(
            "Round {}: {} players unpaired after the main pass, trying fallback pairing",
            round,
            leftovers.len()
        );
        match fallback_pass_a(&leftovers) {
            Ok(extra) => pairs.extend(extra),
            Err((partial, remaining)) => {
                if !options.allow_forced_repeats {
                    return Err(PairingError::Infeasible {
                        unpaired: remaining.iter().map(|p| p.id.clone()).collect(),
                    });
                }
                pairs = fallback_pass_b(&active, pairs, &leftovers, partial, &remaining)
                    .ok_or_else(|| PairingError::Infeasible {
                        unpaired: remaining.iter().map(|p| p.id.clone()).collect(),
                    })?;
                pairing.degraded = true;
            }
        }
    }

    pairs.sort_by(|a, b| seed_order(higher_seed(*a), higher_seed(*b)));
    pairing.floaters = pairs
        .iter()
        .filter(|(a, b)| a.points != b.points)
        .map(|(a, b)| if a.points > b.points { a.id.clone() } else { b.id.clone() })
        .collect();

    pairing.boards = pairs
        .iter()
        .enumerate()
        .map(|(index, &(first, second))| {
            let assignment = if round == 1 {
                first_round_colors(index, first, second)
            } else {
                colors::allocate(first, second)
            };
            // Every pair reaching this point passed color legality.
            let assignment = assignment.unwrap_or(ColorAssignment {
                first: Color::White,
                inverted: false,
            });
            let (white, black) = assignment.seat(first, second);
            let forced_repeat = white.has_played(&black.id);
            if forced_repeat {
                tracing::warn!(
                    "Round {}: forced repeat pairing {} vs {}",
                    round,
                    white.id,
                    black.id
                );
            }
            Board {
                white: white.id.clone(),
                black: black.id.clone(),
                forced_repeat,
            }
        })
        .collect();

    Ok(pairing)
}

/// Standings order: points, then Elo, both descending; ID keeps it total.
fn seed_order(a: &Player, b: &Player) -> Ordering {
    b.points
        .cmp(&a.points)
        .then(b.initial_elo.cmp(&a.initial_elo))
        .then(a.id.cmp(&b.id))
}

fn higher_seed<'a>((a, b): Pair<'a>) -> &'a Player {
    if seed_order(a, b) == Ordering::Greater {
        b
    } else {
        a
    }
}

/// Picks the bye: lowest points, then lowest Elo, among players without a
/// bye. Falls back to everyone when all have had one.
fn select_bye(active: &[&Player]) -> (usize, bool) {
    let key = |(index, p): &(usize, &&Player)| (p.points, p.initial_elo, Reverse(*index));
    let fresh = active
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.received_bye)
        .min_by_key(key);
    match fresh {
        Some((index, _)) => (index, false),
        None => {
            let index = active
                .iter()
                .enumerate()
                .min_by_key(key)
                .map_or(0, |(index, _)| index);
            (index, true)
        }
    }
}

/// Picks the downfloater of an odd pool: no bye yet, fewest previous
/// downfloats, lowest Elo, then the lowest position.
fn select_floater(pool: &[&Player]) -> usize {
    pool.iter()
        .enumerate()
        .min_by_key(|(index, p)| (p.received_bye, p.downfloats, p.initial_elo, Reverse(*index)))
        .map_or(0, |(index, _)| index)
}

/// Whether `a` and `b` may meet: no previous game and a legal coloring.
fn is_legal(a: &Player, b: &Player) -> bool {
    !a.has_played(&b.id) && colors::allocate(a, b).is_some()
}

/// Indices `start, start+1, start-1, start+2, start-2, ...` within `0..len`.
fn probe_order(start: usize, len: usize) -> impl Iterator<Item = usize> {
    std::iter::once(Some(start))
        .chain((1..len).flat_map(move |step| [Some(start + step), start.checked_sub(step)]))
        .flatten()
        .filter(move |&index| index < len)
}

/// The score-group fold. Returns the pairs made and everyone left over.
fn main_pass<'a>(active: &[&'a Player]) -> (Vec<Pair<'a>>, Vec<&'a Player>) {
    let mut pairs = Vec::new();
    let mut carry: Vec<&'a Player> = Vec::new();

    let mut start = 0;
    while start < active.len() {
        let points = active[start].points;
        let end = active[start..]
            .iter()
            .position(|p| p.points != points)
            .map_or(active.len(), |offset| start + offset);

        let mut pool: Vec<&'a Player> = std::mem::take(&mut carry);
        pool.extend_from_slice(&active[start..end]);
        start = end;

        if pool.len() % 2 == 1 {
            let floater = pool.remove(select_floater(&pool));
            carry.push(floater);
        }

        let half = pool.len() / 2;
        let top = &pool[..half];
        let bottom: Vec<&'a Player> = pool[half..].iter().rev().copied().collect();
        let mut taken = vec![false; bottom.len()];

        for (i, &upper) in top.iter().enumerate() {
            let partner = probe_order(i, bottom.len())
                .find(|&j| !taken[j] && is_legal(upper, bottom[j]));
            match partner {
                Some(j) => {
                    taken[j] = true;
                    pairs.push((upper, bottom[j]));
                }
                None => carry.push(upper),
            }
        }
        carry.extend(
            bottom
                .iter()
                .zip(&taken)
                .filter(|(_, &taken)| !taken)
                .map(|(&p, _)| p),
        );
        carry.sort_by(|a, b| seed_order(a, b));
    }

    (pairs, carry)
}

/// Pass A: pair the leftovers without repeats.
///
/// On failure returns the greedy partial pairing and who is still unpaired.
#[allow(clippy::type_complexity)]
fn fallback_pass_a<'a>(
    leftovers: &[&'a Player],
) -> Result<Vec<Pair<'a>>, (Vec<Pair<'a>>, Vec<&'a Player>)> {
    if let Some(pairs) = perfect_matching(leftovers, false) {
        return Ok(pairs);
    }

    let mut ordered = leftovers.to_vec();
    ordered.sort_by(|a, b| seed_order(a, b));
    let mut used = vec![false; ordered.len()];
    let mut pairs = Vec::new();
    for i in 0..ordered.len() {
        if used[i] {
            continue;
        }
        let partner = (i + 1..ordered.len()).find(|&j| !used[j] && is_legal(ordered[i], ordered[j]));
        if let Some(j) = partner {
            used[i] = true;
            used[j] = true;
            pairs.push((ordered[i], ordered[j]));
        }
    }
    let remaining = ordered
        .iter()
        .zip(&used)
        .filter(|(_, &used)| !used)
        .map(|(&p, _)| p)
        .collect();
    Err((pairs, remaining))
}

/// Pass B: allow repeated opponents, widening the search until it succeeds.
///
/// Tries the players Pass A left behind, then all main-pass leftovers, then
/// the whole field.
fn fallback_pass_b<'a>(
    active: &[&'a Player],
    main_pairs: Vec<Pair<'a>>,
    leftovers: &[&'a Player],
    partial: Vec<Pair<'a>>,
    remaining: &[&'a Player],
) -> Option<Vec<Pair<'a>>> {
    if remaining.len() % 2 == 0 {
        if let Some(extra) = perfect_matching(remaining, true) {
            let mut pairs = main_pairs;
            pairs.extend(partial);
            pairs.extend(extra);
            return Some(pairs);
        }
    }
    if let Some(extra) = perfect_matching(leftovers, true) {
        let mut pairs = main_pairs;
        pairs.extend(extra);
        return Some(pairs);
    }
    tracing::warn!("Fallback pairing of leftovers failed, re-pairing the whole field");
    perfect_matching(active, true)
}

/// Depth-first search for a complete, color-legal pairing of `players`.
///
/// Candidates are tried in seed order; when repeats are allowed, new
/// opponents are still tried before old ones.
fn perfect_matching<'a>(players: &[&'a Player], allow_repeats: bool) -> Option<Vec<Pair<'a>>> {
    if players.len() % 2 == 1 {
        return None;
    }
    let mut ordered = players.to_vec();
    ordered.sort_by(|a, b| seed_order(a, b));

    let mut search = Search {
        players: ordered,
        used: vec![false; players.len()],
        pairs: Vec::with_capacity(players.len() / 2),
        allow_repeats,
        budget: SEARCH_BUDGET,
    };
    if search.run() {
        Some(search.pairs)
    } else {
        None
    }
}

struct Search<'a> {
    players: Vec<&'a Player>,
    used: Vec<bool>,
    pairs: Vec<Pair<'a>>,
    allow_repeats: bool,
    budget: usize,
}

impl<'a> Search<'a> {
    fn run(&mut self) -> bool {
        let Some(i) = self.used.iter().position(|used| !used) else {
            return true;
        };
        if self.budget == 0 {
            return false;
        }
        self.budget -= 1;

        let first = self.players[i];
        self.used[i] = true;
        let mut candidates: Vec<usize> = (i + 1..self.players.len())
            .filter(|&j| !self.used[j])
            .collect();
        candidates.sort_by_key(|&j| first.has_played(&self.players[j].id));

        for j in candidates {
            let second = self.players[j];
            if first.has_played(&second.id) && !self.allow_repeats {
                continue;
            }
            if colors::allocate(first, second).is_none() {
                continue;
            }
            self.used[j] = true;
            self.pairs.push((first, second));
            if self.run() {
                return true;
            }
            self.pairs.pop();
            self.used[j] = false;
        }
        self.used[i] = false;
        false
    }
}

/// First-round colors: the higher seed has white on even boards and black on
/// odd ones, unless that breaks an absolute constraint.
fn first_round_colors(index: usize, first: &Player, second: &Player) -> Option<ColorAssignment> {
    let provisional = colors::allocate(first, second)?;
    let top_is_first = std::ptr::eq(higher_seed((first, second)), first);
    let top_color = if index % 2 == 0 {
        Color::White
    } else {
        Color::Black
    };
    let wanted = if top_is_first {
        top_color
    } else {
        top_color.opposite()
    };
    if colors::admissible(first, second, wanted) {
        Some(ColorAssignment {
            first: wanted,
            inverted: false,
        })
    } else {
        Some(provisional)
    }
}
