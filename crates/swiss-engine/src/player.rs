//! Tournament-scoped player state.
//!
//! A [`Player`] is one person's participation in one tournament. It is keyed by
//! the same [`PlayerId`] as the career record in the registry but never
//! touches it before finalization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use swiss_core::{Color, Outcome, PlayerId, Points};

/// Longest allowed run of the same color.
pub const MAX_COLOR_RUN: u32 = 2;

/// Largest allowed gap between white and black games.
pub const MAX_COLOR_DIFFERENCE: i32 = 2;

/// Color bookkeeping established at pairing time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorHistory {
    #[serde(default)]
    pub white_games: u32,
    #[serde(default)]
    pub black_games: u32,
    #[serde(default)]
    pub last_color: Option<Color>,
    #[serde(default)]
    pub white_run: u32,
    #[serde(default)]
    pub black_run: u32,
}

impl ColorHistory {
    /// White games minus black games.
    pub fn difference(&self) -> i32 {
        self.white_games as i32 - self.black_games as i32
    }

    /// Length of the current run of `color`.
    pub fn run(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white_run,
            Color::Black => self.black_run,
        }
    }

    /// Whether receiving `color` next keeps the absolute constraints:
    /// |difference| stays within 2 and no color runs three times.
    pub fn admits(&self, color: Color) -> bool {
        let difference = self.difference() + color.balance();
        difference.abs() <= MAX_COLOR_DIFFERENCE && self.run(color) < MAX_COLOR_RUN
    }

    /// Books one game with `color`.
    pub fn record(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_games += 1;
                self.white_run += 1;
                self.black_run = 0;
            }
            Color::Black => {
                self.black_games += 1;
                self.black_run += 1;
                self.white_run = 0;
            }
        }
        self.last_color = Some(color);
    }

    /// The color this history leans towards, if any.
    ///
    /// Alternation from the last game wins; with no games played, the
    /// balance decides.
    pub fn leaning(&self) -> Option<Color> {
        if let Some(last) = self.last_color {
            return Some(last.opposite());
        }
        match self.difference() {
            d if d > 0 => Some(Color::Black),
            d if d < 0 => Some(Color::White),
            _ => None,
        }
    }
}

/// One line in a player's results history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub round: u32,
    /// `None` for a bye.
    #[serde(default)]
    pub opponent: Option<PlayerId>,
    /// `None` for a bye.
    #[serde(default)]
    pub color: Option<Color>,
    pub outcome: Outcome,
    pub score: Points,
}

impl ResultEntry {
    /// Builds the bye entry for `round`.
    pub fn bye(round: u32) -> Self {
        ResultEntry {
            round,
            opponent: None,
            color: None,
            outcome: Outcome::Bye,
            score: Points::ONE,
        }
    }

    /// Builds the entry for a decided game seen from the player on `color`.
    pub fn game(round: u32, opponent: &PlayerId, color: Color, outcome: Outcome) -> Self {
        ResultEntry {
            round,
            opponent: Some(opponent.clone()),
            color: Some(color),
            outcome,
            score: outcome.score_for(color).unwrap_or(Points::ZERO),
        }
    }

    /// Whether this entry is the game against `opponent` in `round`.
    pub fn is_game(&self, round: u32, opponent: &PlayerId) -> bool {
        self.round == round && self.opponent.as_ref() == Some(opponent)
    }
}

/// A player's participation in a tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Elo frozen when the tournament starts.
    pub initial_elo: i32,
    /// K-factor resolved against the career record.
    #[serde(default)]
    pub k_factor: Option<u32>,
    #[serde(default)]
    pub points: Points,
    #[serde(default)]
    pub opponents: BTreeSet<PlayerId>,
    #[serde(default)]
    pub colors: ColorHistory,
    #[serde(default)]
    pub received_bye: bool,
    #[serde(default)]
    pub withdrawn: bool,
    /// Times this player was moved down into a lower score group.
    #[serde(default)]
    pub downfloats: u32,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
    #[serde(default)]
    pub buchholz: Option<Points>,
    #[serde(default)]
    pub performance: Option<i32>,
    #[serde(default)]
    pub elo_change: Option<i32>,
    #[serde(default)]
    pub rank: Option<u32>,
}

impl Player {
    /// Creates a player with a clean tournament record.
    pub fn new(id: PlayerId, name: impl Into<String>, initial_elo: i32) -> Self {
        Player {
            id,
            name: name.into(),
            initial_elo,
            k_factor: None,
            points: Points::ZERO,
            opponents: BTreeSet::new(),
            colors: ColorHistory::default(),
            received_bye: false,
            withdrawn: false,
            downfloats: 0,
            results: Vec::new(),
            buchholz: None,
            performance: None,
            elo_change: None,
            rank: None,
        }
    }

    /// Whether this player has already faced `other`.
    pub fn has_played(&self, other: &PlayerId) -> bool {
        self.opponents.contains(other)
    }

    /// Whether this player takes part in pairings.
    pub fn is_active(&self) -> bool {
        !self.withdrawn
    }

    /// Entries of games that count for rating.
    pub fn rated_results(&self) -> impl Iterator<Item = &ResultEntry> {
        self.results.iter().filter(|entry| entry.outcome.is_rated())
    }
}
