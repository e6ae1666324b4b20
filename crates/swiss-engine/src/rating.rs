//! FIDE rating arithmetic.
//!
//! Expected score, rating change, performance rating and K-factor resolution.
//! All functions are pure; callers decide which games count.

use chrono::{Datelike, NaiveDate};

/// Largest rating gap taken into account by the expected-score formula.
pub const RATING_DIFFERENCE_CAP: i32 = 400;

/// K-factor used when no career record is available.
pub const DEFAULT_K_FACTOR: u32 = 20;

/// Percentage score (50..=100) to rating difference, FIDE table 8.1(a).
/// Scores below 50% mirror it with a negative sign.
const PERCENTAGE_DIFFERENCE: [i32; 51] = [
    0, 7, 14, 21, 29, 36, 43, 50, 57, 65, 72, 80, 87, 95, 102, 110, 117, 125, 133, 141, 149, 158,
    166, 175, 184, 193, 202, 211, 220, 230, 240, 251, 262, 273, 284, 296, 309, 322, 336, 351, 366,
    383, 401, 422, 444, 470, 501, 538, 589, 677, 800,
];

/// A game that counts for rating, seen from one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatedGame {
    /// The opponent's Elo at tournament start.
    pub opponent_elo: i32,
    /// 1.0, 0.5 or 0.0.
    pub score: f64,
}

/// Calculate expected score for a player against an opponent.
///
/// The rating gap is clamped to ±400 before applying the logistic curve.
pub fn expected_score(rating: i32, opponent_rating: i32) -> f64 {
    let gap = (opponent_rating - rating).clamp(-RATING_DIFFERENCE_CAP, RATING_DIFFERENCE_CAP);
    1.0 / (1.0 + 10_f64.powf(f64::from(gap) / 400.0))
}

/// Calculate the rating change over a tournament.
///
/// Expected and actual scores are summed over all `games` using the ratings
/// frozen at tournament start, then `K * (actual - expected)` is rounded half
/// away from zero.
pub fn elo_change(k_factor: u32, rating: i32, games: &[RatedGame]) -> i32 {
    let (actual, expected) = games.iter().fold((0.0, 0.0), |(actual, expected), game| {
        (
            actual + game.score,
            expected + expected_score(rating, game.opponent_elo),
        )
    });
    (f64::from(k_factor) * (actual - expected)).round() as i32
}

/// Rating difference for a fractional score, rounded to the nearest percent.
pub fn percentage_difference(fraction: f64) -> i32 {
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as usize;
    if percent >= 50 {
        PERCENTAGE_DIFFERENCE[percent - 50]
    } else {
        -PERCENTAGE_DIFFERENCE[50 - percent]
    }
}

/// Calculate the performance rating over `games`.
///
/// Average opponent rating plus the table difference for the score
/// percentage. With no rated games the player's own rating is returned.
pub fn performance(rating: i32, games: &[RatedGame]) -> i32 {
    if games.is_empty() {
        return rating;
    }
    let count = games.len() as f64;
    let score: f64 = games.iter().map(|game| game.score).sum();
    let average = games
        .iter()
        .map(|game| f64::from(game.opponent_elo))
        .sum::<f64>()
        / count;
    (average + f64::from(percentage_difference(score / count))).round() as i32
}

/// The career data K-factor resolution looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingProfile {
    pub elo: i32,
    pub games_played: u32,
    pub experienced: bool,
    pub birth_date: Option<NaiveDate>,
}

/// Completed years between `birth` and `on`.
pub fn age_on(birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Resolve the FIDE K-factor for `profile` as of `on`.
///
/// 1. Fewer than 30 rated games and not flagged experienced: 40.
/// 2. Under 18 and rated below 2300: 40. Skipped without a birth date.
/// 3. Rated below 2400: 20.
/// 4. Otherwise: 10.
pub fn k_factor(profile: &RatingProfile, on: NaiveDate) -> u32 {
    if profile.games_played < 30 && !profile.experienced {
        return 40;
    }
    if let Some(birth) = profile.birth_date {
        if age_on(birth, on) < 18 && profile.elo < 2300 {
            return 40;
        }
    }
    if profile.elo < 2400 {
        20
    } else {
        10
    }
}
