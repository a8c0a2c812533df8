//! Serializable summary of a finished round

use geojson::FeatureCollection;
use pathrace_core::prelude::*;
use serde::Serialize;

use crate::{RoundError, player::PlayerPath, round::Round};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceReport {
    pub algorithm: AlgorithmKind,
    pub path_found: bool,
    /// Common end time of both timelines
    pub duration_ms: Millis,
    pub ticks: usize,
    pub steps: usize,
    pub explored: usize,
    pub optimal_path: Vec<OsmNodeId>,
    pub optimal_distance_meters: f64,
    pub algorithm_timeline: Vec<Waypoint>,
    pub player_timeline: Vec<Waypoint>,
    pub player_path: Option<PlayerPath>,
    pub score: Option<ScoreResult>,
}

impl RaceReport {
    /// # Errors
    ///
    /// [`RoundError::WrongPhase`] if the round never started a race.
    pub fn from_round(round: &Round) -> Result<Self, RoundError> {
        let run = round.run().ok_or(RoundError::WrongPhase {
            action: "report",
            phase: round.phase(),
        })?;
        let graph = round.graph();
        let optimal = run.optimal_path();

        Ok(Self {
            algorithm: run.algorithm().kind(),
            path_found: run.path_found(),
            duration_ms: run.playback().timer(),
            ticks: run.ticks(),
            steps: run.algorithm().steps(),
            explored: run.algorithm().scratch().visited_count(),
            optimal_path: optimal
                .iter()
                .filter_map(|&idx| graph.node_at(idx).map(|n| n.id))
                .collect(),
            optimal_distance_meters: graph.path_length_m(&optimal),
            algorithm_timeline: run.timeline().waypoints().to_vec(),
            player_timeline: round.player_timeline().waypoints().to_vec(),
            player_path: round.player_path().cloned(),
            score: round.score().cloned(),
        })
    }
}

/// Both timelines of `round` plus its optimal path as one `FeatureCollection`
///
/// # Errors
///
/// [`RoundError::WrongPhase`] without a race, [`Error::GeoJsonError`] if a
/// feature cannot be built.
pub fn race_geojson(round: &Round) -> Result<FeatureCollection, RoundError> {
    let run = round.run().ok_or(RoundError::WrongPhase {
        action: "export",
        phase: round.phase(),
    })?;

    let mut collection = merge_collections([
        run.timeline().to_geojson("algorithm")?,
        round.player_timeline().to_geojson("player")?,
    ]);
    let optimal = run.optimal_path();
    if optimal.len() > 1 {
        collection
            .features
            .push(path_feature(round.graph(), &optimal, "optimal")?);
    }
    Ok(collection)
}
