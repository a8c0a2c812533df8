//! Road network model
//!
//! Nodes, edges and the owning graph the search algorithms run on.

pub mod components;
pub mod network;
pub mod road_class;

pub use components::{RoadEdge, RoadNode};
pub use network::{IndexedPoint, Neighbor, RoadGraph};
pub use road_class::RoadClass;
