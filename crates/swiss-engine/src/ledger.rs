//! Result entry and cancellation.
//!
//! Only the outcome-dependent state moves here: points and results histories.
//! Opponent sets and color counters belong to the pairing and stay put when a
//! result is cancelled.

use crate::tournament::{Match, Tournament, TournamentError};
use swiss_core::{Outcome, PlayerId};

impl Tournament {
    /// Records `outcome` for a pending game of the current round.
    ///
    /// # Errors
    ///
    /// Rejects unknown matches, matches of earlier rounds, byes, outcomes other
    /// than `W`, `B`, `D`, `F`, and games that already have a result.
    pub fn record_result(&mut self, match_id: u32, outcome: Outcome) -> Result<(), TournamentError> {
        if !outcome.is_recordable() {
            return Err(TournamentError::NotRecordable(outcome));
        }
        let game = self.current_match(match_id)?;
        if !game.outcome.is_pending() {
            return Err(TournamentError::AlreadyDecided(match_id));
        }

        let mut decided = game.clone();
        decided.outcome = outcome;
        let Some((white_entry, black_entry)) = decided.result_entries() else {
            return Err(TournamentError::ByeIsImmutable(match_id));
        };
        let black_id = white_entry
            .opponent
            .clone()
            .ok_or(TournamentError::ByeIsImmutable(match_id))?;
        self.ensure_player(&decided.white)?;
        self.ensure_player(&black_id)?;

        if let Some(white) = self.player_mut(&decided.white) {
            white.points += white_entry.score;
            white.results.push(white_entry);
        }
        if let Some(black) = self.player_mut(&black_id) {
            black.points += black_entry.score;
            black.results.push(black_entry);
        }
        self.set_outcome(match_id, outcome);

        tracing::info!(
            "Round {} match {}: {} {} {}",
            decided.round,
            match_id,
            decided.white,
            outcome,
            black_id
        );
        Ok(())
    }

    /// Resets a decided game of the current round to pending and returns the
    /// outcome it had.
    pub fn cancel_result(&mut self, match_id: u32) -> Result<Outcome, TournamentError> {
        let game = self.current_match(match_id)?.clone();
        if !game.outcome.is_cancellable() {
            return Err(TournamentError::NotDecided(match_id));
        }
        let (Some(black_id), Some((white_entry, black_entry))) = (&game.black, game.result_entries())
        else {
            return Err(TournamentError::NotDecided(match_id));
        };

        if let Some(white) = self.player_mut(&game.white) {
            white.points = white.points.saturating_sub(white_entry.score);
            white.results.retain(|entry| !entry.is_game(game.round, black_id));
        }
        if let Some(black) = self.player_mut(black_id) {
            black.points = black.points.saturating_sub(black_entry.score);
            black.results.retain(|entry| !entry.is_game(game.round, &game.white));
        }
        self.set_outcome(match_id, Outcome::Pending);

        tracing::info!("Round {} match {}: result {} cancelled", game.round, match_id, game.outcome);
        Ok(game.outcome)
    }

    fn current_match(&self, match_id: u32) -> Result<&Match, TournamentError> {
        if self.is_finalized() {
            return Err(TournamentError::Finalized);
        }
        let game = self
            .find_match(match_id)
            .ok_or(TournamentError::UnknownMatch(match_id))?;
        if game.round != self.current_round {
            return Err(TournamentError::MatchNotInCurrentRound {
                id: match_id,
                round: game.round,
                current: self.current_round,
            });
        }
        if game.is_bye() {
            return Err(TournamentError::ByeIsImmutable(match_id));
        }
        Ok(game)
    }

    fn ensure_player(&self, id: &PlayerId) -> Result<(), TournamentError> {
        self.player(id)
            .map(|_| ())
            .ok_or_else(|| TournamentError::UnknownPlayer(id.clone()))
    }

    fn set_outcome(&mut self, match_id: u32, outcome: Outcome) {
        if let Some(game) = self
            .rounds
            .iter_mut()
            .flat_map(|r| r.matches.iter_mut())
            .find(|m| m.id == match_id)
        {
            game.outcome = outcome;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::PairingOptions;
    use crate::player::{Player, ResultEntry};
    use chrono::NaiveDate;
    use swiss_core::{Color, Points};

    fn started() -> Tournament {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 4, 3).unwrap();
        let mut tournament = Tournament::new("Ledger Cup", start, end, 3).unwrap();
        for (id, elo) in [("A", 1800), ("B", 1700), ("C", 1600), ("D", 1500), ("E", 1400)] {
            tournament
                .add_player(Player::new(PlayerId::from(id), id, elo))
                .unwrap();
        }
        tournament.start(|_| None, &PairingOptions::default()).unwrap();
        tournament
    }

    fn points(tournament: &Tournament, id: &str) -> Points {
        tournament.player(&PlayerId::from(id)).unwrap().points
    }

    #[test]
    fn record_applies_scores_and_history() {
        let mut tournament = started();
        let game = tournament.current().unwrap().matches[0].clone();
        let black = game.black.clone().unwrap();

        tournament.record_result(game.id, Outcome::Draw).unwrap();

        let white = tournament.player(&game.white).unwrap();
        assert_eq!(white.points, Points::HALF);
        assert_eq!(
            white.results,
            vec![ResultEntry::game(1, &black, Color::White, Outcome::Draw)]
        );
        assert_eq!(tournament.player(&black).unwrap().points, Points::HALF);
        assert_eq!(tournament.find_match(game.id).unwrap().outcome, Outcome::Draw);
    }

    #[test]
    fn record_rejects_second_result() {
        let mut tournament = started();
        tournament.record_result(1, Outcome::WhiteWins).unwrap();
        assert_eq!(
            tournament.record_result(1, Outcome::BlackWins),
            Err(TournamentError::AlreadyDecided(1))
        );
    }

    #[test]
    fn record_rejects_bye_and_unknown_match() {
        let mut tournament = started();
        let bye = tournament.current().unwrap().matches.last().unwrap().id;
        assert_eq!(
            tournament.record_result(bye, Outcome::WhiteWins),
            Err(TournamentError::ByeIsImmutable(bye))
        );
        assert_eq!(
            tournament.record_result(99, Outcome::WhiteWins),
            Err(TournamentError::UnknownMatch(99))
        );
        assert_eq!(
            tournament.record_result(1, Outcome::Bye),
            Err(TournamentError::NotRecordable(Outcome::Bye))
        );
        assert_eq!(
            tournament.record_result(1, Outcome::Pending),
            Err(TournamentError::NotRecordable(Outcome::Pending))
        );
    }

    #[test]
    fn double_forfeit_scores_nothing() {
        let mut tournament = started();
        let game = tournament.current().unwrap().matches[1].clone();
        tournament.record_result(game.id, Outcome::DoubleForfeit).unwrap();
        assert_eq!(tournament.player(&game.white).unwrap().points, Points::ZERO);
        assert_eq!(tournament.player(&game.white).unwrap().results.len(), 1);
    }

    #[test]
    fn cancel_restores_outcome_state_only() {
        let mut tournament = started();
        let before = tournament.players.clone();
        let game = tournament.current().unwrap().matches[0].clone();

        tournament.record_result(game.id, Outcome::WhiteWins).unwrap();
        assert_eq!(points(&tournament, game.white.as_str()), Points::ONE);

        let cancelled = tournament.cancel_result(game.id).unwrap();
        assert_eq!(cancelled, Outcome::WhiteWins);
        assert_eq!(tournament.players, before);
        assert!(tournament.find_match(game.id).unwrap().outcome.is_pending());
        assert!(tournament
            .player(&game.white)
            .unwrap()
            .has_played(game.black.as_ref().unwrap()));
    }

    #[test]
    fn cancel_requires_a_result() {
        let mut tournament = started();
        assert_eq!(tournament.cancel_result(1), Err(TournamentError::NotDecided(1)));
        let bye = tournament.current().unwrap().matches.last().unwrap().id;
        assert_eq!(tournament.cancel_result(bye), Err(TournamentError::ByeIsImmutable(bye)));
    }

    #[test]
    fn earlier_rounds_are_closed() {
        let mut tournament = started();
        let ids: Vec<u32> = tournament.current().unwrap().matches.iter().map(|m| m.id).collect();
        for id in &ids[..2] {
            tournament.record_result(*id, Outcome::WhiteWins).unwrap();
        }
        tournament.pair_next_round(&PairingOptions::default()).unwrap();
        assert_eq!(
            tournament.cancel_result(ids[0]),
            Err(TournamentError::MatchNotInCurrentRound {
                id: ids[0],
                round: 1,
                current: 2
            })
        );
    }
}
