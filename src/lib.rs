//! Game rounds of the path race.
//!
//! A [`Round`] picks two road nodes, optionally lets a player draw a route
//! between them, then races the drawn route against a search algorithm on a
//! shared clock and scores the player against the optimal path.

pub mod compare;
pub mod error;
pub mod player;
pub mod report;
pub mod round;

#[cfg(test)]
mod test_support;

pub use compare::compare_algorithms;
pub use error::RoundError;
pub use player::{MAX_LEG_STEPS, PlayerPath, player_road_path};
pub use report::{RaceReport, race_geojson};
pub use round::{DrawingProgress, Round, RoundPhase};
