//! Tournament state machine.
//!
//! A tournament moves one way through
//! `Setup -> Round r in progress -> Round r complete -> ... -> Finalized`.
//! Players are locked when round 1 is paired; each later round is paired only
//! once every game of the previous round has a result. Result entry and
//! cancellation live in [`crate::ledger`], finalization in
//! [`crate::finalize`].

use crate::pairing::{self, PairingError, PairingOptions, RoundPairing};
use crate::player::{ColorHistory, Player, ResultEntry};
use crate::schedule::{self, RoundWindow, ScheduleError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use swiss_core::{Color, Outcome, PlayerId, Points};
use thiserror::Error;

/// Errors raised by tournament operations.
///
/// None of these leave the tournament modified.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TournamentError {
    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("players can only change before round 1 is paired")]
    NotInSetup,
    #[error("the tournament has not started")]
    NotStarted,
    #[error("the tournament is finalized and read-only")]
    Finalized,
    #[error("player {0} is already entered")]
    DuplicatePlayer(PlayerId),
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("at least two active players are needed, got {0}")]
    TooFewPlayers(usize),
    #[error("unknown match {0}")]
    UnknownMatch(u32),
    #[error("match {id} belongs to round {round}, the current round is {current}")]
    MatchNotInCurrentRound { id: u32, round: u32, current: u32 },
    #[error("match {0} is a bye; bye results are fixed")]
    ByeIsImmutable(u32),
    #[error("'{0}' cannot be entered as a result")]
    NotRecordable(Outcome),
    #[error("match {0} already has a result")]
    AlreadyDecided(u32),
    #[error("match {0} has no result to cancel")]
    NotDecided(u32),
    #[error("round {0} still has games without a result")]
    RoundIncomplete(u32),
    #[error("all {0} rounds have been paired")]
    NoRoundsLeft(u32),
    #[error("only {played} of {total} rounds are complete")]
    RoundsRemaining { played: u32, total: u32 },
    #[error("round {round} could not be paired: {source}")]
    Pairing {
        round: u32,
        #[source]
        source: PairingError,
    },
}

/// Where the tournament stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Setup,
    InProgress { round: u32 },
    RoundComplete { round: u32 },
    Finalized,
}

/// A single game, or a bye when `black` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Monotonic within the tournament, never reused.
    pub id: u32,
    pub round: u32,
    pub white: PlayerId,
    #[serde(default)]
    pub black: Option<PlayerId>,
    #[serde(default)]
    pub outcome: Outcome,
    /// Paired a second time by fallback Pass B.
    #[serde(default)]
    pub forced_repeat: bool,
}

impl Match {
    pub fn is_bye(&self) -> bool {
        self.black.is_none()
    }

    /// Result entries for white and black once the game is decided.
    pub fn result_entries(&self) -> Option<(ResultEntry, ResultEntry)> {
        let black = self.black.as_ref()?;
        if self.outcome.is_pending() {
            return None;
        }
        Some((
            ResultEntry::game(self.round, black, Color::White, self.outcome),
            ResultEntry::game(self.round, &self.white, Color::Black, self.outcome),
        ))
    }
}

/// One round of the tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub index: u32,
    pub window: RoundWindow,
    #[serde(default)]
    pub matches: Vec<Match>,
}

impl Round {
    /// Whether every game has a result. Byes are decided at pairing.
    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(|m| !m.outcome.is_pending())
    }

    /// Number of games still awaiting a result.
    pub fn pending(&self) -> usize {
        self.matches.iter().filter(|m| m.outcome.is_pending()).count()
    }
}

fn first_match_id() -> u32 {
    1
}

/// A Swiss tournament and everything needed to resume it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_rounds: u32,
    #[serde(default)]
    pub windows: Vec<RoundWindow>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub rounds: Vec<Round>,
    #[serde(default = "first_match_id")]
    pub next_match_id: u32,
    #[serde(default)]
    pub current_round: u32,
    /// Incremented on every load.
    #[serde(default)]
    pub launch_count: u32,
    #[serde(default)]
    pub completed_on: Option<NaiveDate>,
    #[serde(skip)]
    index: HashMap<PlayerId, usize>,
}

impl Tournament {
    /// Creates an empty tournament in setup.
    ///
    /// # Errors
    ///
    /// Returns [`TournamentError::Schedule`] if `end` precedes `start` or
    /// `total_rounds` is zero.
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_rounds: u32,
    ) -> Result<Self, TournamentError> {
        let windows = schedule::round_windows(start_date, end_date, total_rounds)?;
        Ok(Tournament {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            start_date,
            end_date,
            total_rounds,
            windows,
            players: Vec::new(),
            rounds: Vec::new(),
            next_match_id: first_match_id(),
            current_round: 0,
            launch_count: 0,
            completed_on: None,
            index: HashMap::new(),
        })
    }

    pub fn status(&self) -> Status {
        if self.completed_on.is_some() {
            return Status::Finalized;
        }
        match self.rounds.last() {
            None => Status::Setup,
            Some(round) if round.is_complete() => Status::RoundComplete { round: round.index },
            Some(round) => Status::InProgress { round: round.index },
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.completed_on.is_some()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        match self.index.get(id) {
            Some(&i) if self.players.get(i).is_some_and(|p| &p.id == id) => self.players.get(i),
            _ => self.players.iter().find(|p| &p.id == id),
        }
    }

    pub(crate) fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        let position = match self.index.get(id) {
            Some(&i) if self.players.get(i).is_some_and(|p| &p.id == id) => Some(i),
            _ => self.players.iter().position(|p| &p.id == id),
        };
        position.and_then(move |i| self.players.get_mut(i))
    }

    pub fn round(&self, index: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.index == index)
    }

    /// The latest paired round.
    pub fn current(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn find_match(&self, id: u32) -> Option<&Match> {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .find(|m| m.id == id)
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    /// Enters a player. Only allowed in setup.
    pub fn add_player(&mut self, player: Player) -> Result<(), TournamentError> {
        if self.status() != Status::Setup {
            return Err(TournamentError::NotInSetup);
        }
        if self.player(&player.id).is_some() {
            return Err(TournamentError::DuplicatePlayer(player.id));
        }
        tracing::debug!("Entered {} ({}) at {}", player.name, player.id, player.initial_elo);
        self.players.push(player);
        self.rebuild_index();
        Ok(())
    }

    /// Excludes a player from all later pairings. Games already paired stay.
    pub fn withdraw(&mut self, id: &PlayerId) -> Result<(), TournamentError> {
        if self.is_finalized() {
            return Err(TournamentError::Finalized);
        }
        let player = self
            .player_mut(id)
            .ok_or_else(|| TournamentError::UnknownPlayer(id.clone()))?;
        if !player.withdrawn {
            player.withdrawn = true;
            tracing::info!("{} withdrawn", id);
        }
        Ok(())
    }

    /// Locks the field, snapshots K-factors and pairs round 1.
    ///
    /// `resolve_k` supplies each player's K-factor from the career record;
    /// `None` leaves it to be defaulted at finalization.
    pub fn start<F>(&mut self, resolve_k: F, options: &PairingOptions) -> Result<(), TournamentError>
    where
        F: Fn(&PlayerId) -> Option<u32>,
    {
        if self.status() != Status::Setup {
            return Err(TournamentError::NotInSetup);
        }
        let active = self.active_players().count();
        if active < 2 {
            return Err(TournamentError::TooFewPlayers(active));
        }

        self.windows = schedule::round_windows(self.start_date, self.end_date, self.total_rounds)?;
        let pairing = pairing::pair_round(&self.players, 1, options)
            .map_err(|source| TournamentError::Pairing { round: 1, source })?;
        for player in &mut self.players {
            player.k_factor = resolve_k(&player.id);
        }
        self.commit(1, pairing);
        tracing::info!(
            "Tournament '{}' started with {} players over {} rounds",
            self.name,
            self.players.len(),
            self.total_rounds
        );
        Ok(())
    }

    /// Pairs the round after a completed one.
    ///
    /// # Errors
    ///
    /// Fails if the current round has pending games, every round has been
    /// paired, or no legal pairing exists. The tournament is unchanged on
    /// error.
    pub fn pair_next_round(&mut self, options: &PairingOptions) -> Result<u32, TournamentError> {
        let completed = match self.status() {
            Status::Setup => return Err(TournamentError::NotStarted),
            Status::Finalized => return Err(TournamentError::Finalized),
            Status::InProgress { round } => return Err(TournamentError::RoundIncomplete(round)),
            Status::RoundComplete { round } => round,
        };
        if completed >= self.total_rounds {
            return Err(TournamentError::NoRoundsLeft(self.total_rounds));
        }
        let round = completed + 1;
        let pairing = pairing::pair_round(&self.players, round, options)
            .map_err(|source| TournamentError::Pairing { round, source })?;
        self.commit(round, pairing);
        Ok(round)
    }

    /// Writes a round's pairing into matches and pairing-time player state.
    fn commit(&mut self, round: u32, pairing: RoundPairing) {
        let window = self
            .windows
            .get(round as usize - 1)
            .or(self.windows.last())
            .copied()
            .unwrap_or(RoundWindow {
                start: self.start_date,
                end: self.end_date,
            });
        let mut matches = Vec::with_capacity(pairing.boards.len() + 1);

        for board in pairing.boards {
            if let Some(white) = self.player_mut(&board.white) {
                white.opponents.insert(board.black.clone());
                white.colors.record(Color::White);
            }
            if let Some(black) = self.player_mut(&board.black) {
                black.opponents.insert(board.white.clone());
                black.colors.record(Color::Black);
            }
            matches.push(Match {
                id: self.take_match_id(),
                round,
                white: board.white,
                black: Some(board.black),
                outcome: Outcome::Pending,
                forced_repeat: board.forced_repeat,
            });
        }

        for floater in &pairing.floaters {
            if let Some(player) = self.player_mut(floater) {
                player.downfloats += 1;
            }
        }

        if let Some(bye) = pairing.bye {
            if let Some(player) = self.player_mut(&bye) {
                player.received_bye = true;
                player.points += Points::ONE;
                player.results.push(ResultEntry::bye(round));
            }
            tracing::info!("Round {}: bye for {}", round, bye);
            matches.push(Match {
                id: self.take_match_id(),
                round,
                white: bye,
                black: None,
                outcome: Outcome::Bye,
                forced_repeat: false,
            });
        }

        tracing::info!("Round {} paired: {} matches", round, matches.len());
        self.rounds.push(Round {
            index: round,
            window,
            matches,
        });
        self.current_round = round;
    }

    fn take_match_id(&mut self) -> u32 {
        let id = self.next_match_id;
        self.next_match_id += 1;
        id
    }

    pub(crate) fn rebuild_index(&mut self) {
        self.index = self
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
    }

    /// Rebuilds every derived field from the pairing and result history.
    ///
    /// Points, opponents, color counters, bye flags, downfloat counts and
    /// results histories are recomputed from the rounds; cached values that
    /// disagree are replaced and logged. Returns the number of players corrected.
    pub fn reconcile(&mut self) -> usize {
        self.rebuild_index();

        #[derive(Default, PartialEq)]
        struct Derived {
            points: Points,
            opponents: BTreeSet<PlayerId>,
            colors: ColorHistory,
            received_bye: bool,
            downfloats: u32,
            results: Vec<ResultEntry>,
        }

        let mut derived: Vec<Derived> = self.players.iter().map(|_| Derived::default()).collect();
        let mut highest_match_id = 0;

        for round in &self.rounds {
            // Scores the round was paired on.
            let paired_on: Vec<Points> = derived.iter().map(|d| d.points).collect();
            for m in &round.matches {
                highest_match_id = highest_match_id.max(m.id);
                let Some(&white) = self.index.get(&m.white) else {
                    tracing::warn!("Match {} references unknown player {}", m.id, m.white);
                    continue;
                };
                let Some(black_id) = &m.black else {
                    derived[white].received_bye = true;
                    if m.outcome == Outcome::Bye {
                        derived[white].points += Points::ONE;
                        derived[white].results.push(ResultEntry::bye(m.round));
                    }
                    continue;
                };
                let Some(&black) = self.index.get(black_id) else {
                    tracing::warn!("Match {} references unknown player {}", m.id, black_id);
                    continue;
                };
                derived[white].opponents.insert(black_id.clone());
                derived[black].opponents.insert(m.white.clone());
                derived[white].colors.record(Color::White);
                derived[black].colors.record(Color::Black);
                if paired_on[white] > paired_on[black] {
                    derived[white].downfloats += 1;
                } else if paired_on[black] > paired_on[white] {
                    derived[black].downfloats += 1;
                }
                if let Some((white_entry, black_entry)) = m.result_entries() {
                    derived[white].points += white_entry.score;
                    derived[black].points += black_entry.score;
                    derived[white].results.push(white_entry);
                    derived[black].results.push(black_entry);
                }
            }
        }

        let mut corrected = 0;
        for (player, rebuilt) in self.players.iter_mut().zip(derived) {
            let cached = Derived {
                points: player.points,
                opponents: std::mem::take(&mut player.opponents),
                colors: std::mem::take(&mut player.colors),
                received_bye: player.received_bye,
                downfloats: player.downfloats,
                results: std::mem::take(&mut player.results),
            };
            if cached != rebuilt {
                tracing::warn!("Cached state of {} disagreed with history, rebuilt", player.id);
                corrected += 1;
            }
            player.points = rebuilt.points;
            player.opponents = rebuilt.opponents;
            player.colors = rebuilt.colors;
            player.received_bye = rebuilt.received_bye;
            player.downfloats = rebuilt.downfloats;
            player.results = rebuilt.results;
        }

        self.current_round = self.rounds.last().map_or(0, |r| r.index);
        self.next_match_id = self.next_match_id.max(highest_match_id + 1);
        corrected
    }

    /// Total points handed out so far, byes included.
    pub fn awarded_points(&self) -> Points {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .map(|m| match m.result_entries() {
                Some((white, black)) => white.score + black.score,
                None if m.outcome == Outcome::Bye => Points::ONE,
                None => Points::ZERO,
            })
            .sum()
    }
}
