//! Road path behind a player's hand-drawn route

use std::sync::Arc;

use log::{debug, warn};
use pathrace_core::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

/// Step ceiling of the search run between two consecutive player waypoints
pub const MAX_LEG_STEPS: usize = 5_000;

/// Roads a player's waypoints imply, leg by leg
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPath {
    #[serde(skip)]
    pub nodes: Vec<NodeIndex>,
    pub node_ids: Vec<OsmNodeId>,
    pub distance_meters: f64,
    /// First leg `(i, i + 1)` without a road connection; the path stops before it
    pub failed_leg: Option<(usize, usize)>,
}

impl PlayerPath {
    pub fn is_partial(&self) -> bool {
        self.failed_leg.is_some()
    }
}

/// Connects consecutive `waypoints` with A*.
///
/// Every leg runs its own algorithm instance, so legs are searched in
/// parallel. Legs are stitched in order up to the first one without a path.
pub fn player_road_path(graph: &Arc<RoadGraph>, waypoints: &[NodeIndex]) -> PlayerPath {
    let legs: Vec<Option<Vec<NodeIndex>>> = waypoints
        .par_windows(2)
        .map(|pair| road_leg(graph, pair[0], pair[1]))
        .collect();

    let mut nodes: Vec<NodeIndex> = waypoints.first().copied().into_iter().collect();
    let mut failed_leg = None;
    for (i, leg) in legs.into_iter().enumerate() {
        match leg {
            Some(leg) => nodes.extend(leg.into_iter().skip(1)),
            None => {
                warn!("No road connection between player waypoints {i} and {}", i + 1);
                failed_leg = Some((i, i + 1));
                break;
            }
        }
    }

    let distance_meters = graph.path_length_m(&nodes);
    debug!(
        "Player road path: {} nodes over {distance_meters:.0} m",
        nodes.len()
    );
    PlayerPath {
        node_ids: nodes
            .iter()
            .filter_map(|&idx| graph.node_at(idx).map(|n| n.id))
            .collect(),
        nodes,
        distance_meters,
        failed_leg,
    }
}

fn road_leg(graph: &Arc<RoadGraph>, from: NodeIndex, to: NodeIndex) -> Option<Vec<NodeIndex>> {
    let mut search =
        SearchAlgorithm::started(AlgorithmKind::AStar, Arc::clone(graph), from, to).ok()?;
    match search.run_to_completion(MAX_LEG_STEPS) {
        SearchOutcome::Found { path, .. } => Some(path),
        SearchOutcome::BudgetExceeded { steps } => {
            debug!("Leg search gave up after {steps} steps");
            None
        }
        SearchOutcome::Unreachable { .. } => None,
    }
}
