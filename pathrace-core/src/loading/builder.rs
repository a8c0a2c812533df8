use geo::{Distance, Haversine, Point};
use hashbrown::HashSet;
use itertools::Itertools;
use log::{debug, info};

use super::raw_types::RawRoadData;
use crate::{Error, OsmNodeId, RoadGraph};

/// Builds a road graph from raw nodes and ways.
///
/// First pass inserts every node, second pass connects consecutive way nodes.
///
/// # Errors
///
/// Returns [`Error::GraphIntegrity`] if a way references a node missing from
/// the data and [`Error::InvalidData`] for empty data or invalid coordinates.
pub fn build_road_graph(data: &RawRoadData) -> Result<RoadGraph, Error> {
    validate_data(data)?;
    info!(
        "Building road graph from {} nodes and {} ways",
        data.nodes.len(),
        data.ways.len()
    );

    let mut graph = RoadGraph::new();
    for node in &data.nodes {
        graph.add_node(node.id, node.lat, node.lon);
    }

    for way in &data.ways {
        for (&from, &to) in way.nodes.iter().tuple_windows() {
            graph
                .connect(from, to, way.road_type.as_deref(), !way.oneway)
                .map_err(integrity_error)?;
        }
    }

    info!(
        "Road graph ready: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Builds a road graph restricted to the nodes within `radius_km` of `center`.
///
/// Way segments leaving the circle are dropped; only references to nodes
/// absent from the data altogether are integrity errors.
///
/// # Errors
///
/// Same as [`build_road_graph`], plus [`Error::InvalidConfig`] for a
/// non-positive radius.
pub fn build_road_graph_within(
    data: &RawRoadData,
    center: Point<f64>,
    radius_km: f64,
) -> Result<RoadGraph, Error> {
    validate_data(data)?;
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "search radius must be positive, got {radius_km}"
        )));
    }

    let radius_m = radius_km * 1000.0;
    let known: HashSet<OsmNodeId> = data.nodes.iter().map(|n| n.id).collect();

    let mut graph = RoadGraph::new();
    for node in &data.nodes {
        if Haversine.distance(center, Point::new(node.lon, node.lat)) <= radius_m {
            graph.add_node(node.id, node.lat, node.lon);
        }
    }
    debug!(
        "{} of {} nodes lie within {radius_km} km of the search center",
        graph.node_count(),
        data.nodes.len()
    );

    for way in &data.ways {
        for (&from, &to) in way.nodes.iter().tuple_windows() {
            if let Some(missing) = [from, to].into_iter().find(|id| !known.contains(id)) {
                return Err(integrity_error(Error::UnknownNode(missing)));
            }
            if graph.node_index(from).is_none() || graph.node_index(to).is_none() {
                continue;
            }
            graph.connect(from, to, way.road_type.as_deref(), !way.oneway)?;
        }
    }

    info!(
        "Road graph within {radius_km} km ready: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

fn integrity_error(error: Error) -> Error {
    match error {
        Error::UnknownNode(id) => {
            Error::GraphIntegrity(format!("way references unknown node {id}"))
        }
        other => other,
    }
}

fn validate_data(data: &RawRoadData) -> Result<(), Error> {
    if data.nodes.is_empty() {
        return Err(Error::InvalidData("road data contains no nodes".to_string()));
    }

    if let Some(node) = data
        .nodes
        .iter()
        .find(|n| !n.lat.is_finite() || !n.lon.is_finite())
    {
        return Err(Error::InvalidData(format!(
            "node {} has invalid coordinates",
            node.id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::{RawNode, RawWay};

    fn sample() -> RawRoadData {
        RawRoadData {
            nodes: (0..4)
                .map(|i| RawNode {
                    id: i,
                    lat: 0.0,
                    lon: i as f64 * 0.01,
                })
                .collect(),
            ways: vec![
                RawWay {
                    nodes: vec![0, 1, 2, 3],
                    road_type: Some("residential".to_string()),
                    oneway: false,
                },
                RawWay {
                    nodes: vec![3, 2],
                    road_type: None,
                    oneway: true,
                },
            ],
        }
    }

    #[test]
    fn connects_consecutive_way_nodes() {
        let graph = build_road_graph(&sample()).unwrap();
        assert_eq!(graph.node_count(), 4);
        // 3 -> 2 duplicates the bidirectional 2 - 3 edge
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn unknown_way_node_aborts_build() {
        let mut data = sample();
        data.ways.push(RawWay {
            nodes: vec![1, 42],
            road_type: None,
            oneway: false,
        });
        assert!(matches!(
            build_road_graph(&data),
            Err(Error::GraphIntegrity(_))
        ));
    }

    #[test]
    fn empty_data_is_rejected() {
        assert!(matches!(
            build_road_graph(&RawRoadData::default()),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn radius_filter_drops_far_nodes() {
        // nodes are ~1.1 km apart along the equator
        let graph = build_road_graph_within(&sample(), Point::new(0.0, 0.0), 1.5).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.node(3).is_none());
    }

    #[test]
    fn radius_must_be_positive() {
        assert!(matches!(
            build_road_graph_within(&sample(), Point::new(0.0, 0.0), 0.0),
            Err(Error::InvalidConfig(_))
        ));
    }
}
