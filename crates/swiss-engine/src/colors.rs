//! Color allocation for a candidate pair.
//!
//! The allocator first works out which side the pair "wants" through the
//! preference cascade, then checks the absolute constraints for both players.
//! If the preferred assignment breaks a constraint the inverse is tried; if
//! that fails too the pair cannot be colored and the pairing engine must look
//! for another partner.

use crate::player::Player;
use swiss_core::Color;

/// Colors decided for an ordered pair `(first, second)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorAssignment {
    /// Color of the first player; the second gets the opposite.
    pub first: Color,
    /// Set when the absolute constraints overrode the preference cascade.
    pub inverted: bool,
}

impl ColorAssignment {
    /// Returns `(white, black)` for the pair the assignment was made for.
    pub fn seat<'a>(&self, first: &'a Player, second: &'a Player) -> (&'a Player, &'a Player) {
        match self.first {
            Color::White => (first, second),
            Color::Black => (second, first),
        }
    }
}

/// Decides colors for `first` and `second`.
///
/// Returns `None` when neither assignment satisfies the absolute constraints,
/// which the pairing engine treats as an illegal pair.
pub fn allocate(first: &Player, second: &Player) -> Option<ColorAssignment> {
    let preferred = preferred_color(first, second);
    if admissible(first, second, preferred) {
        return Some(ColorAssignment {
            first: preferred,
            inverted: false,
        });
    }

    let inverse = preferred.opposite();
    if admissible(first, second, inverse) {
        tracing::debug!(
            "Color inversion for {} vs {}: {} gets {} instead of {}",
            first.id,
            second.id,
            first.id,
            inverse,
            preferred
        );
        return Some(ColorAssignment {
            first: inverse,
            inverted: true,
        });
    }

    None
}

/// Whether `first` may take `color` while `second` takes the opposite.
pub fn admissible(first: &Player, second: &Player, color: Color) -> bool {
    first.colors.admits(color) && second.colors.admits(color.opposite())
}

/// The preference cascade, expressed as the color `first` should receive.
fn preferred_color(first: &Player, second: &Player) -> Color {
    let first_difference = first.colors.difference();
    let second_difference = second.colors.difference();

    // The player further behind on white gets it.
    if first_difference != second_difference {
        return if first_difference < second_difference {
            Color::White
        } else {
            Color::Black
        };
    }

    // Alternation: whoever just had black gets white.
    let first_last = first.colors.last_color;
    let second_last = second.colors.last_color;
    if first_last != second_last {
        return match (first_last, second_last) {
            (Some(Color::Black), _) => Color::White,
            (_, Some(Color::Black)) => Color::Black,
            (Some(Color::White), _) => Color::Black,
            _ => Color::White,
        };
    }

    // Same history: the higher seed gets its leaning, ties go to `first`.
    if second.initial_elo > first.initial_elo {
        second.colors.leaning().unwrap_or(Color::White).opposite()
    } else {
        first.colors.leaning().unwrap_or(Color::White)
    }
}
