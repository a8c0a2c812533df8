//! Core of the path race: a road network graph, stepwise search algorithms,
//! the distance-based animation timeline and the scoring of hand-drawn
//! routes against the optimal path.

pub mod error;
pub mod export;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod race;
pub mod scoring;
pub mod search;
pub mod timeline;

pub use error::Error;
pub use model::{RoadEdge, RoadGraph, RoadNode};

/// OSM identifier of a road node
pub type OsmNodeId = i64;

/// Virtual clock value in milliseconds
pub type Millis = f64;

/// Step ceiling for synchronous search runs outside the animated stepper
pub const MAX_SEARCH_STEPS: usize = 10_000;
