//! Shared fixtures for unit tests

use pathrace_core::prelude::*;

/// Two parallel streets joined at both ends, a one-way cut-through and one
/// isolated node
pub(crate) const LADDER: &str = r#"{
    "nodes": [
        {"id": 10, "lat": 51.5000, "lon": -0.1200},
        {"id": 11, "lat": 51.5000, "lon": -0.1190},
        {"id": 12, "lat": 51.5000, "lon": -0.1180},
        {"id": 13, "lat": 51.5000, "lon": -0.1170},
        {"id": 20, "lat": 51.5020, "lon": -0.1200},
        {"id": 21, "lat": 51.5020, "lon": -0.1190},
        {"id": 22, "lat": 51.5020, "lon": -0.1180},
        {"id": 23, "lat": 51.5020, "lon": -0.1170},
        {"id": 99, "lat": 51.5100, "lon": -0.1100}
    ],
    "ways": [
        {"nodes": [10, 11, 12, 13], "roadType": "primary"},
        {"nodes": [20, 21, 22, 23], "roadType": "residential"},
        {"nodes": [10, 20], "roadType": "tertiary"},
        {"nodes": [13, 23], "roadType": "tertiary"},
        {"nodes": [21, 11], "roadType": "service", "oneway": true}
    ]
}"#;

pub(crate) fn ladder_data() -> RawRoadData {
    RawRoadData::from_json(LADDER).unwrap()
}

pub(crate) fn ladder() -> RoadGraph {
    build_road_graph(&ladder_data()).unwrap()
}

pub(crate) fn node(graph: &RoadGraph, id: OsmNodeId) -> NodeIndex {
    graph.node_index(id).unwrap()
}

/// Coordinates of node `id` as a map click (`x` = lon, `y` = lat)
pub(crate) fn click(graph: &RoadGraph, id: OsmNodeId) -> geo::Point<f64> {
    graph.node(id).unwrap().geometry
}
