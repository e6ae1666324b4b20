//! Tournament scores in half-point steps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use thiserror::Error;

/// Errors that can occur when converting a number into [`Points`].
#[derive(Debug, Error, PartialEq)]
pub enum PointsError {
    #[error("points must not be negative, got {0}")]
    Negative(f64),

    #[error("points must be a multiple of 0.5, got {0}")]
    NotHalfStep(f64),
}

/// A non-negative score stored as a whole number of half points.
///
/// Serializes as a plain number (`2.5`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "f64", try_from = "f64")]
pub struct Points(u32);

impl Points {
    pub const ZERO: Points = Points(0);
    pub const HALF: Points = Points(1);
    pub const ONE: Points = Points(2);

    /// Creates points from a count of half points.
    #[inline]
    pub const fn from_halves(halves: u32) -> Self {
        Points(halves)
    }

    /// Returns the number of half points.
    #[inline]
    pub const fn halves(self) -> u32 {
        self.0
    }

    /// Returns the score as a float, for rating arithmetic.
    #[inline]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    /// Subtracts, stopping at zero.
    #[inline]
    pub const fn saturating_sub(self, other: Points) -> Points {
        Points(self.0.saturating_sub(other.0))
    }
}

impl Add for Points {
    type Output = Points;

    fn add(self, rhs: Points) -> Points {
        Points(self.0 + rhs.0)
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Points) {
        self.0 += rhs.0;
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Points>>(iter: I) -> Points {
        iter.fold(Points::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Points> for Points {
    fn sum<I: Iterator<Item = &'a Points>>(iter: I) -> Points {
        iter.copied().sum()
    }
}

impl From<Points> for f64 {
    fn from(points: Points) -> f64 {
        points.as_f64()
    }
}

impl TryFrom<f64> for Points {
    type Error = PointsError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value < 0.0 {
            return Err(PointsError::Negative(value));
        }
        let halves = value * 2.0;
        if halves.fract() != 0.0 || !halves.is_finite() {
            return Err(PointsError::NotHalfStep(value));
        }
        Ok(Points(halves as u32))
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 2;
        if self.0 % 2 == 0 {
            write!(f, "{}", whole)
        } else {
            write!(f, "{}.5", whole)
        }
    }
}
