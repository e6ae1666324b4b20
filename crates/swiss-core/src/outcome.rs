//! Match outcome tags.

use crate::{Color, Points};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing an outcome tag.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutcomeError {
    #[error("unknown outcome tag '{0}', expected one of W, B, D, F")]
    Unknown(String),
}

/// The result of a match, as a tag.
///
/// Scoring, rating eligibility and cancel eligibility all derive from the tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// White won.
    #[serde(rename = "W")]
    WhiteWins,
    /// Black won.
    #[serde(rename = "B")]
    BlackWins,
    /// Drawn game.
    #[serde(rename = "D")]
    Draw,
    /// Double forfeit: 0-0, no rating effect.
    #[serde(rename = "F")]
    DoubleForfeit,
    /// Full point for the white-field player, no opponent.
    #[serde(rename = "BYE")]
    Bye,
    /// Not decided yet.
    #[default]
    #[serde(rename = "PENDING")]
    Pending,
}

impl Outcome {
    /// Outcomes an operator may enter for a paired game.
    pub const RECORDABLE: [Outcome; 4] = [
        Outcome::WhiteWins,
        Outcome::BlackWins,
        Outcome::Draw,
        Outcome::DoubleForfeit,
    ];

    /// Returns the score awarded to the player on `color`, or `None` while pending.
    ///
    /// A bye awards its single player a full point regardless of `color`.
    pub const fn score_for(self, color: Color) -> Option<Points> {
        let white = match self {
            Outcome::WhiteWins => Points::ONE,
            Outcome::BlackWins => Points::ZERO,
            Outcome::Draw => Points::HALF,
            Outcome::DoubleForfeit => return Some(Points::ZERO),
            Outcome::Bye => return Some(Points::ONE),
            Outcome::Pending => return None,
        };
        match color {
            Color::White => Some(white),
            Color::Black => Some(Points::from_halves(2 - white.halves())),
        }
    }

    /// Whether the game counts for Elo and performance.
    pub const fn is_rated(self) -> bool {
        matches!(self, Outcome::WhiteWins | Outcome::BlackWins | Outcome::Draw)
    }

    /// Whether an operator may enter this tag for a pending game.
    pub const fn is_recordable(self) -> bool {
        matches!(
            self,
            Outcome::WhiteWins | Outcome::BlackWins | Outcome::Draw | Outcome::DoubleForfeit
        )
    }

    /// Whether a recorded result with this tag may be cancelled.
    pub const fn is_cancellable(self) -> bool {
        self.is_recordable()
    }

    /// Whether the match still awaits a result.
    pub const fn is_pending(self) -> bool {
        matches!(self, Outcome::Pending)
    }

    /// Returns the short tag used in storage and on the command line.
    pub const fn tag(self) -> &'static str {
        match self {
            Outcome::WhiteWins => "W",
            Outcome::BlackWins => "B",
            Outcome::Draw => "D",
            Outcome::DoubleForfeit => "F",
            Outcome::Bye => "BYE",
            Outcome::Pending => "PENDING",
        }
    }
}

impl FromStr for Outcome {
    type Err = OutcomeError;

    /// Parses an operator-entered tag. Only recordable tags are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "W" | "1-0" => Ok(Outcome::WhiteWins),
            "B" | "0-1" => Ok(Outcome::BlackWins),
            "D" | "1/2-1/2" => Ok(Outcome::Draw),
            "F" | "0-0" => Ok(Outcome::DoubleForfeit),
            _ => Err(OutcomeError::Unknown(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::WhiteWins => write!(f, "1-0"),
            Outcome::BlackWins => write!(f, "0-1"),
            Outcome::Draw => write!(f, "1/2-1/2"),
            Outcome::DoubleForfeit => write!(f, "0-0 (forfeit)"),
            Outcome::Bye => write!(f, "bye"),
            Outcome::Pending => write!(f, "pending"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisive_scores() {
        assert_eq!(Outcome::WhiteWins.score_for(Color::White), Some(Points::ONE));
        assert_eq!(Outcome::WhiteWins.score_for(Color::Black), Some(Points::ZERO));
        assert_eq!(Outcome::BlackWins.score_for(Color::White), Some(Points::ZERO));
        assert_eq!(Outcome::BlackWins.score_for(Color::Black), Some(Points::ONE));
    }

    #[test]
    fn draw_forfeit_bye_and_pending_scores() {
        assert_eq!(Outcome::Draw.score_for(Color::White), Some(Points::HALF));
        assert_eq!(Outcome::Draw.score_for(Color::Black), Some(Points::HALF));
        assert_eq!(Outcome::DoubleForfeit.score_for(Color::White), Some(Points::ZERO));
        assert_eq!(Outcome::DoubleForfeit.score_for(Color::Black), Some(Points::ZERO));
        assert_eq!(Outcome::Bye.score_for(Color::White), Some(Points::ONE));
        assert_eq!(Outcome::Pending.score_for(Color::White), None);
    }

    #[test]
    fn rating_eligibility() {
        assert!(Outcome::WhiteWins.is_rated());
        assert!(Outcome::Draw.is_rated());
        assert!(!Outcome::DoubleForfeit.is_rated());
        assert!(!Outcome::Bye.is_rated());
        assert!(!Outcome::Pending.is_rated());
    }

    #[test]
    fn bye_and_pending_are_not_recordable() {
        assert!(!Outcome::Bye.is_recordable());
        assert!(!Outcome::Pending.is_recordable());
        assert!(!Outcome::Bye.is_cancellable());
        assert!(Outcome::RECORDABLE.iter().all(|o| o.is_recordable()));
    }

    #[test]
    fn parse_tags() {
        assert_eq!("w".parse::<Outcome>(), Ok(Outcome::WhiteWins));
        assert_eq!(" B ".parse::<Outcome>(), Ok(Outcome::BlackWins));
        assert_eq!("1/2-1/2".parse::<Outcome>(), Ok(Outcome::Draw));
        assert_eq!("F".parse::<Outcome>(), Ok(Outcome::DoubleForfeit));
        assert_eq!(
            "BYE".parse::<Outcome>(),
            Err(OutcomeError::Unknown("BYE".to_string()))
        );
        assert!("x".parse::<Outcome>().is_err());
    }

    #[test]
    fn serde_uses_short_tags() {
        assert_eq!(serde_json::to_string(&Outcome::Bye).unwrap(), "\"BYE\"");
        assert_eq!(serde_json::to_string(&Outcome::Draw).unwrap(), "\"D\"");
        let parsed: Outcome = serde_json::from_str("\"F\"").unwrap();
        assert_eq!(parsed, Outcome::DoubleForfeit);
    }
}
