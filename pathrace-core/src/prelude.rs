pub use crate::MAX_SEARCH_STEPS;

// Graph model and loading
pub use crate::loading::{
    RaceConfig, RawNode, RawRoadData, RawWay, build_road_graph, build_road_graph_within,
};
pub use crate::model::{RoadClass, RoadEdge, RoadGraph, RoadNode};

// Search
pub use crate::search::{
    AlgorithmKind, SearchAlgorithm, SearchOutcome, SearchStats, SearchStatus, StepUpdate,
    StepwiseSearch, reconstruct_path, shortest_path,
};

// Animation and scoring
pub use crate::export::{merge_collections, path_feature};
pub use crate::race::RunState;
pub use crate::scoring::{Grade, ScoreResult, ScoringEngine};
pub use crate::timeline::{
    FALLBACK_DURATION_MS, PlaybackController, PlaybackDirection, SegmentKind, TIME_DENSITY,
    TimelineScheduler, Waypoint, synchronize,
};

// Core types
pub use crate::Error;
pub use crate::Millis; // milliseconds
pub use crate::OsmNodeId;
pub use petgraph::graph::NodeIndex;
