//! Core types for Swiss-system chess tournaments.
//!
//! This crate provides the value types shared across the tournament engine:
//! - [`Color`] for the side a player is assigned on a board
//! - [`Outcome`] for the result tag of a match
//! - [`Points`] for tournament scores in half-point steps
//! - [`PlayerId`] for player identity and deterministic ID generation

mod color;
mod outcome;
mod player_id;
mod points;

pub use color::Color;
pub use outcome::{Outcome, OutcomeError};
pub use player_id::{PlayerId, PlayerIdError};
pub use points::{Points, PointsError};
