//! Scoring of a player-drawn route against the optimal path found by a search

use geo::{Distance, Euclidean, Point};
use log::{debug, warn};
use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::{
    RoadGraph,
    search::{SearchScratch, StepwiseSearch, reconstruct_path},
};

/// Distance in degrees within which a player point hits an optimal node (~111 m)
pub const HIT_THRESHOLD_DEG: f64 = 0.001;

pub const MAX_GRANULARITY_BONUS: u32 = 10;

/// Ceiling on the parent-chain walk when rebuilding the optimal path
pub const MAX_PATH_STEPS: usize = 1000;

/// Points awarded for a round at 100 % efficiency
pub const MAX_ROUND_SCORE: u32 = 1000;

pub const NOTE_NO_ALGORITHM_PATH: &str = "Algorithm path not found";
pub const NOTE_MISSING_DATA: &str = "Missing data for scoring";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_efficiency(efficiency: u32) -> Self {
        match efficiency {
            90.. => Grade::S,
            80..=89 => Grade::A,
            70..=79 => Grade::B,
            60..=69 => Grade::C,
            50..=59 => Grade::D,
            _ => Grade::F,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Final score in percent, `min(100, coverage + bonus)`
    pub efficiency: u32,
    pub coverage_efficiency: u32,
    pub granularity_bonus: u32,
    pub player_nodes: usize,
    pub optimal_nodes: usize,
    pub nodes_hit: usize,
    pub optimal_distance_meters: f64,
    /// Road distance of the player's route, when it could be reconstructed
    pub player_distance_meters: Option<f64>,
    /// `optimal / player` distance ratio in percent, capped at 100
    pub distance_efficiency: Option<f64>,
    pub round_score: u32,
    pub grade: Grade,
    pub note: Option<String>,
}

impl ScoreResult {
    fn degenerate(efficiency: u32, player_nodes: usize, optimal_nodes: usize, note: &str) -> Self {
        Self {
            efficiency,
            coverage_efficiency: efficiency,
            granularity_bonus: 0,
            player_nodes,
            optimal_nodes,
            nodes_hit: 0,
            optimal_distance_meters: 0.0,
            player_distance_meters: None,
            distance_efficiency: None,
            round_score: round_score(efficiency),
            grade: Grade::from_efficiency(efficiency),
            note: Some(note.to_string()),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_score(efficiency: u32) -> u32 {
    (f64::from(efficiency.min(100)) / 100.0 * f64::from(MAX_ROUND_SCORE)).round() as u32
}

/// Measures how closely a player's route follows the optimal path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringEngine {
    pub hit_threshold_deg: f64,
    pub max_path_steps: usize,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            hit_threshold_deg: HIT_THRESHOLD_DEG,
            max_path_steps: MAX_PATH_STEPS,
        }
    }
}

impl ScoringEngine {
    /// Optimal path start -> end, empty if the end node has no parent chain
    pub fn optimal_path(&self, scratch: &SearchScratch, end: NodeIndex) -> Vec<NodeIndex> {
        if scratch.parent(end).is_none() {
            return Vec::new();
        }
        match reconstruct_path(scratch, end, self.max_path_steps) {
            Ok(path) => path,
            Err(e) => {
                warn!("Ignoring unusable optimal path: {e}");
                Vec::new()
            }
        }
    }

    /// Scores `player` (points as `x` = lon, `y` = lat) against the path a
    /// finished search found
    pub fn score_search(
        &self,
        search: &impl StepwiseSearch,
        player: &[Point<f64>],
        player_distance_meters: Option<f64>,
    ) -> ScoreResult {
        let optimal = match search.endpoints() {
            Some((_, end)) if search.is_finished() => self.optimal_path(search.scratch(), end),
            _ => Vec::new(),
        };
        self.score(search.graph(), &optimal, player, player_distance_meters)
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn score(
        &self,
        graph: &RoadGraph,
        optimal: &[NodeIndex],
        player: &[Point<f64>],
        player_distance_meters: Option<f64>,
    ) -> ScoreResult {
        let player_nodes = player.len();
        if player.is_empty() {
            return ScoreResult::degenerate(0, 0, optimal.len(), NOTE_MISSING_DATA);
        }

        let optimal_distance_meters = graph.path_length_m(optimal);
        if optimal.is_empty() || optimal_distance_meters <= 0.0 {
            return ScoreResult::degenerate(100, player_nodes, optimal.len(), NOTE_NO_ALGORITHM_PATH);
        }

        let nodes_hit = optimal
            .iter()
            .filter_map(|&idx| graph.node_at(idx))
            .filter(|node| {
                player
                    .iter()
                    .any(|p| Euclidean.distance(node.geometry, *p) <= self.hit_threshold_deg)
            })
            .count();

        let coverage_efficiency =
            (nodes_hit as f64 / optimal.len() as f64 * 100.0).round() as u32;
        let granularity_bonus =
            MAX_GRANULARITY_BONUS.min((player_nodes as f64 / 2.0).round() as u32);
        let efficiency = 100.min(coverage_efficiency + granularity_bonus);
        let distance_efficiency = player_distance_meters
            .filter(|&d| d > 0.0)
            .map(|d| (optimal_distance_meters / d * 100.0).min(100.0));

        debug!(
            "Player hit {nodes_hit}/{} optimal nodes: coverage {coverage_efficiency}%, bonus {granularity_bonus}%",
            optimal.len()
        );

        ScoreResult {
            efficiency,
            coverage_efficiency,
            granularity_bonus,
            player_nodes,
            optimal_nodes: optimal.len(),
            nodes_hit,
            optimal_distance_meters,
            player_distance_meters,
            distance_efficiency,
            round_score: round_score(efficiency),
            grade: Grade::from_efficiency(efficiency),
            note: None,
        }
    }
}
