//! Plain-text reports: round pairings, standings and the schedule.
//!
//! Reports are rendered into a `String`; the caller decides where they go.

use crate::standings::Standing;
use crate::tournament::{Round, Tournament};
use chrono::NaiveDate;

/// Formats a date as prose, e.g. "Saturday 5 April 2025".
pub fn human_date(date: NaiveDate) -> String {
    date.format("%A %-d %B %Y").to_string()
}

fn player_label(tournament: &Tournament, id: &swiss_core::PlayerId) -> String {
    match tournament.player(id) {
        Some(player) => format!("{} {} ({}, {})", player.id, player.name, player.initial_elo, player.points),
        None => id.to_string(),
    }
}

/// Renders the pairings and results of one round.
pub fn pairings(tournament: &Tournament, round: &Round) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}: round {} of {}, {} to {}\n",
        tournament.name,
        round.index,
        tournament.total_rounds,
        human_date(round.window.start),
        human_date(round.window.end)
    ));
    for m in &round.matches {
        let white = player_label(tournament, &m.white);
        let line = match &m.black {
            None => format!("{:>4}  {}  bye", m.id, white),
            Some(black) => {
                let result = if m.outcome.is_pending() {
                    "pending".to_string()
                } else {
                    m.outcome.to_string()
                };
                let forced = if m.forced_repeat { "  (repeat)" } else { "" };
                format!(
                    "{:>4}  {}  vs  {}  {}{}",
                    m.id,
                    white,
                    player_label(tournament, black),
                    result,
                    forced
                )
            }
        };
        out.push_str(&format!("{line}\n"));
    }
    let pending = round.pending();
    if pending > 0 {
        out.push_str(&format!("{pending} game(s) pending\n"));
    }
    out
}

/// Renders a standings table. `title` heads the table, e.g. "Standings after round 2".
pub fn standings(title: &str, table: &[Standing]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{title}\n"));
    out.push_str(&format!(
        "{:>4}  {:<10} {:<24} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}\n",
        "Rank", "ID", "Name", "Elo", "Pts", "Buch", "Cut1", "ARO", "Perf", "+/-"
    ));
    for s in table {
        let aro = s.tiebreaks.aro.map_or_else(|| "-".to_string(), |aro| aro.to_string());
        let name = if s.withdrawn {
            format!("{} (w/d)", s.name)
        } else {
            s.name.clone()
        };
        out.push_str(&format!(
            "{:>4}  {:<10} {:<24} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>+5}\n",
            s.rank,
            s.id.as_str(),
            name,
            s.initial_elo,
            s.points.to_string(),
            s.tiebreaks.buchholz.to_string(),
            s.tiebreaks.buchholz_cut1.to_string(),
            aro,
            s.performance,
            s.elo_change
        ));
    }
    out
}

/// Renders the round windows.
pub fn schedule(tournament: &Tournament) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}: {} to {}\n",
        tournament.name,
        human_date(tournament.start_date),
        human_date(tournament.end_date)
    ));
    for (i, window) in tournament.windows.iter().enumerate() {
        let marker = if i as u32 + 1 == tournament.current_round { " <" } else { "" };
        if window.start == window.end {
            out.push_str(&format!("  Round {}: {}{}\n", i + 1, human_date(window.start), marker));
        } else {
            out.push_str(&format!(
                "  Round {}: {} to {}{}\n",
                i + 1,
                human_date(window.start),
                human_date(window.end),
                marker
            ));
        }
    }
    out
}
