//! Round windows over the tournament span.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when laying out round windows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("a tournament needs at least one round")]
    NoRounds,
}

/// Inclusive date range in which a round is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RoundWindow {
    /// Number of days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Spreads `rounds` windows evenly over `start..=end`.
///
/// Windows are contiguous, the first starts on `start`, the last ends on `end`
/// and lengths differ by at most one day, longer windows first. With fewer
/// days than rounds each round gets one day in turn and the tail shares the
/// final day.
pub fn round_windows(
    start: NaiveDate,
    end: NaiveDate,
    rounds: u32,
) -> Result<Vec<RoundWindow>, ScheduleError> {
    if end < start {
        return Err(ScheduleError::EndBeforeStart { start, end });
    }
    if rounds == 0 {
        return Err(ScheduleError::NoRounds);
    }

    let total_days = (end - start).num_days() as u64 + 1;
    let rounds = u64::from(rounds);

    if total_days < rounds {
        return Ok((0..rounds)
            .map(|i| {
                let day = start
                    .checked_add_days(Days::new(i))
                    .map_or(end, |day| day.min(end));
                RoundWindow { start: day, end: day }
            })
            .collect());
    }

    let base = total_days / rounds;
    let extra = total_days % rounds;
    let mut windows = Vec::with_capacity(rounds as usize);
    let mut cursor = start;
    for i in 0..rounds {
        let length = base + u64::from(i < extra);
        let last = cursor
            .checked_add_days(Days::new(length - 1))
            .unwrap_or(end)
            .min(end);
        windows.push(RoundWindow {
            start: cursor,
            end: last,
        });
        cursor = last.checked_add_days(Days::new(1)).unwrap_or(end);
    }
    Ok(windows)
}
