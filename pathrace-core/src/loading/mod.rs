//! This module is responsible for turning raw road data supplied by the
//! data-acquisition layer into a [`RoadGraph`](crate::RoadGraph), and for the
//! race configuration that accompanies it.

mod builder;
mod config;
pub mod raw_types;

pub use builder::{build_road_graph, build_road_graph_within};
pub use config::RaceConfig;
pub use raw_types::{RawNode, RawRoadData, RawWay};
