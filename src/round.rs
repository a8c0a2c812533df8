//! A game round: endpoint selection, route drawing and the synchronized race
//!
//! Free mode skips the drawing phase and only animates the algorithm. Game
//! mode animates the algorithm first, then retimes the player's route to the
//! algorithm's duration, replays both from 0 and scores the player.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use geo::{Distance, Euclidean, Haversine, Point};
use log::{debug, info, warn};
use pathrace_core::prelude::*;
use pathrace_core::scoring::HIT_THRESHOLD_DEG;
use serde::Serialize;

use crate::{
    RoundError,
    player::{PlayerPath, player_road_path},
    report::RaceReport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    Setup,
    Drawing,
    Racing,
    Complete,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundPhase::Setup => "setup",
            RoundPhase::Drawing => "drawing",
            RoundPhase::Racing => "racing",
            RoundPhase::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Result of adding one waypoint to the player's route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingProgress {
    Added,
    /// Snapped onto the node the route already ends with
    Ignored,
    /// The route reached the end node
    Finished,
}

#[derive(Debug, Clone)]
pub struct Round {
    graph: Arc<RoadGraph>,
    config: RaceConfig,
    phase: RoundPhase,
    start: Option<NodeIndex>,
    end: Option<NodeIndex>,
    player_route: Vec<NodeIndex>,
    player_path: Option<PlayerPath>,
    player_timeline: TimelineScheduler,
    run: Option<RunState>,
    replaying: bool,
    score: Option<ScoreResult>,
}

impl Round {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an invalid `config`.
    pub fn new(graph: Arc<RoadGraph>, config: RaceConfig) -> Result<Self, RoundError> {
        config.validate()?;
        Ok(Self {
            graph,
            config,
            phase: RoundPhase::Setup,
            start: None,
            end: None,
            player_route: Vec::new(),
            player_path: None,
            player_timeline: TimelineScheduler::new(),
            run: None,
            replaying: false,
            score: None,
        })
    }

    /// Builds the round's graph from the roads within the search radius of `center`
    ///
    /// # Errors
    ///
    /// Propagates graph loading and configuration errors.
    pub fn from_road_data(
        data: &RawRoadData,
        center: Point<f64>,
        config: RaceConfig,
    ) -> Result<Self, RoundError> {
        config.validate()?;
        let graph = build_road_graph_within(data, center, config.search_radius_km)?;
        Self::new(Arc::new(graph), config)
    }

    /// Snaps `point` (`x` = lon, `y` = lat) to the nearest road node and makes
    /// it the start. Clears the end node and any previous run.
    ///
    /// # Errors
    ///
    /// [`RoundError::WrongPhase`] while drawing or racing,
    /// [`Error::NoPointsFound`] on an empty graph.
    pub fn select_start(&mut self, point: Point<f64>) -> Result<NodeIndex, RoundError> {
        self.ensure_idle("select the start")?;
        let (node, snap_m) = self.graph.nearest_node(&point)?;
        debug!("Start snapped to node {node:?}, {snap_m:.0} m from the click");
        self.select_start_node(node)
    }

    /// Makes `node` the start without snapping. Clears the end node and any
    /// previous run.
    ///
    /// # Errors
    ///
    /// [`RoundError::WrongPhase`] while drawing or racing,
    /// [`Error::InvalidNodeIndex`] for a node outside the graph.
    pub fn select_start_node(&mut self, node: NodeIndex) -> Result<NodeIndex, RoundError> {
        self.ensure_idle("select the start")?;
        self.ensure_node(node)?;
        self.clear_path();
        self.start = Some(node);
        self.end = None;
        Ok(node)
    }

    /// Snaps `point` to the nearest road node and makes it the end
    ///
    /// # Errors
    ///
    /// [`RoundError::MissingEndpoints`] without a start and
    /// [`Error::OutsideSearchArea`] if `point` lies outside the search radius.
    pub fn select_end(&mut self, point: Point<f64>) -> Result<NodeIndex, RoundError> {
        self.ensure_idle("select the end")?;
        let start = self.start.ok_or(RoundError::MissingEndpoints)?;
        self.ensure_in_area(start, point)?;
        let (node, _) = self.graph.nearest_node(&point)?;
        self.select_end_node(node)
    }

    /// Makes `node` the end without snapping
    ///
    /// # Errors
    ///
    /// As [`Round::select_end`], with the radius checked against the node itself.
    pub fn select_end_node(&mut self, node: NodeIndex) -> Result<NodeIndex, RoundError> {
        self.ensure_idle("select the end")?;
        let start = self.start.ok_or(RoundError::MissingEndpoints)?;
        let point = self.ensure_node(node)?;
        self.ensure_in_area(start, point)?;
        self.clear_path();
        self.end = Some(node);
        Ok(node)
    }

    /// Free mode: animates the configured algorithm from start to end
    ///
    /// # Errors
    ///
    /// [`RoundError::MissingEndpoints`] or [`RoundError::WrongPhase`].
    pub fn start_pathfinding(&mut self) -> Result<(), RoundError> {
        self.ensure_idle("start pathfinding")?;
        let (start, end) = self.endpoints()?;
        self.clear_path();
        self.run = Some(RunState::new(Arc::clone(&self.graph), &self.config, start, end)?);
        self.phase = RoundPhase::Racing;
        Ok(())
    }

    /// Game mode: starts the player's route at the start node
    ///
    /// # Errors
    ///
    /// [`RoundError::MissingEndpoints`] or [`RoundError::WrongPhase`].
    pub fn begin_drawing(&mut self) -> Result<(), RoundError> {
        self.ensure_idle("begin drawing")?;
        let (start, _) = self.endpoints()?;
        self.clear_path();
        self.player_route.push(start);
        self.phase = RoundPhase::Drawing;
        Ok(())
    }

    /// Snaps `point` to the road graph and appends it to the player's route.
    ///
    /// Landing on, or within the hit tolerance of, the end node completes the
    /// route with the end node itself.
    ///
    /// # Errors
    ///
    /// [`RoundError::WrongPhase`] outside the drawing phase and
    /// [`Error::OutsideSearchArea`] for a point outside the search radius.
    pub fn add_player_waypoint(&mut self, point: Point<f64>) -> Result<DrawingProgress, RoundError> {
        if self.phase != RoundPhase::Drawing {
            return Err(self.wrong_phase("draw"));
        }
        let (start, end) = self.endpoints()?;
        if self.player_route.last() == Some(&end) {
            return Ok(DrawingProgress::Finished);
        }
        self.ensure_in_area(start, point)?;
        let (node, _) = self.graph.nearest_node(&point)?;
        self.add_player_node(node)
    }

    /// Appends `node` to the player's route without snapping
    ///
    /// # Errors
    ///
    /// As [`Round::add_player_waypoint`], plus [`Error::InvalidNodeIndex`] for
    /// a node outside the graph.
    pub fn add_player_node(&mut self, node: NodeIndex) -> Result<DrawingProgress, RoundError> {
        if self.phase != RoundPhase::Drawing {
            return Err(self.wrong_phase("draw"));
        }
        let (start, end) = self.endpoints()?;
        if self.player_route.last() == Some(&end) {
            return Ok(DrawingProgress::Finished);
        }
        let point = self.ensure_node(node)?;
        self.ensure_in_area(start, point)?;

        if self.player_route.last() == Some(&node) {
            return Ok(DrawingProgress::Ignored);
        }
        self.player_route.push(node);

        let reached_end = node == end || self.deg_distance(node, end) < HIT_THRESHOLD_DEG;
        if !reached_end {
            return Ok(DrawingProgress::Added);
        }
        if node != end {
            self.player_route.push(end);
        }
        info!("Player route finished with {} waypoints", self.player_route.len());
        Ok(DrawingProgress::Finished)
    }

    /// Starts the race of the drawn route against the algorithm.
    ///
    /// An unfinished route is closed with the end node.
    ///
    /// # Errors
    ///
    /// [`RoundError::WrongPhase`] outside the drawing phase.
    pub fn start_race(&mut self) -> Result<(), RoundError> {
        if self.phase != RoundPhase::Drawing {
            return Err(self.wrong_phase("start the race"));
        }
        let (start, end) = self.endpoints()?;
        if self.player_route.last() != Some(&end) {
            self.player_route.push(end);
        }

        let path = player_road_path(&self.graph, &self.player_route);
        if path.is_partial() {
            warn!("Player route is only partially connected by roads");
        }
        self.player_path = Some(path);
        self.player_timeline = TimelineScheduler::from_route(
            self.player_route.iter().filter_map(|&idx| self.graph.node_at(idx)),
            SegmentKind::Player,
        );
        self.run = Some(RunState::new(Arc::clone(&self.graph), &self.config, start, end)?);
        self.replaying = false;
        self.phase = RoundPhase::Racing;
        Ok(())
    }

    /// Advances the race by one frame and returns the resulting phase.
    ///
    /// In a completed round only the replay clock moves.
    ///
    /// # Errors
    ///
    /// [`RoundError::WrongPhase`] if no race was started.
    pub fn tick(&mut self, delta_ms: Millis) -> Result<RoundPhase, RoundError> {
        let is_game = self.is_game();
        let phase = self.phase;
        let Some(run) = self.run.as_mut() else {
            return Err(self.wrong_phase("tick"));
        };
        if !run.tick(delta_ms) || phase == RoundPhase::Complete {
            return Ok(phase);
        }

        if is_game {
            if !self.replaying {
                // both timelines now end together and replay from 0
                let target = self.player_timeline.synchronize(run.timer());
                run.playback_mut().set_timer(target);
                run.playback_mut().restart();
                self.replaying = true;
                debug!("Player timeline synchronized to {target:.0} ms, replaying");
                return Ok(self.phase);
            }
            if run.playback().is_playing() {
                return Ok(self.phase);
            }
            self.score = Some(self.compute_score());
        }

        self.phase = RoundPhase::Complete;
        info!("Round complete after {} ticks", run_ticks(self.run.as_ref()));
        Ok(self.phase)
    }

    /// Drives the round to completion in frames of `frame_ms`.
    ///
    /// A round in setup runs in free mode, a round in drawing starts the race
    /// with the route drawn so far.
    ///
    /// # Errors
    ///
    /// [`Error::StepBudgetExceeded`] if the round is not complete after
    /// `max_frames` frames, [`Error::InvalidConfig`] for a non-positive frame.
    pub fn run_headless(&mut self, frame_ms: Millis, max_frames: usize) -> Result<RaceReport, RoundError> {
        self.run_headless_until(frame_ms, max_frames, &AtomicBool::new(false))
    }

    /// [`Round::run_headless`] that checks `abort` before every frame
    ///
    /// # Errors
    ///
    /// As [`Round::run_headless`], plus [`RoundError::Aborted`] once `abort`
    /// is set. The round stays in the racing phase.
    pub fn run_headless_until(
        &mut self,
        frame_ms: Millis,
        max_frames: usize,
        abort: &AtomicBool,
    ) -> Result<RaceReport, RoundError> {
        if !frame_ms.is_finite() || frame_ms <= 0.0 {
            return Err(Error::InvalidConfig(format!("frame must be positive, got {frame_ms}")).into());
        }
        match self.phase {
            RoundPhase::Setup => self.start_pathfinding()?,
            RoundPhase::Drawing => self.start_race()?,
            RoundPhase::Racing | RoundPhase::Complete => {}
        }

        let mut frames = 0;
        while self.phase != RoundPhase::Complete {
            if abort.load(Ordering::Relaxed) {
                warn!("Round aborted after {frames} frames");
                return Err(RoundError::Aborted { frames });
            }
            if frames >= max_frames {
                warn!("Round not complete after {max_frames} frames");
                return Err(Error::StepBudgetExceeded(max_frames).into());
            }
            self.tick(frame_ms)?;
            frames += 1;
        }
        RaceReport::from_round(self)
    }

    /// Discards the run, the player's route and the score; keeps the endpoints
    pub fn clear_path(&mut self) {
        self.run = None;
        self.player_route.clear();
        self.player_path = None;
        self.player_timeline = TimelineScheduler::new();
        self.replaying = false;
        self.score = None;
        self.phase = RoundPhase::Setup;
    }

    fn compute_score(&self) -> ScoreResult {
        let Some(run) = &self.run else {
            return ScoringEngine::default().score(&self.graph, &[], &[], None);
        };
        let points: Vec<Point<f64>> = self
            .player_route
            .iter()
            .filter_map(|&idx| self.graph.node_at(idx).map(|n| n.geometry))
            .collect();
        let player_distance = self
            .player_path
            .as_ref()
            .filter(|path| !path.is_partial())
            .map(|path| path.distance_meters);

        let score = ScoringEngine::default().score_search(run.algorithm(), &points, player_distance);
        info!(
            "Player scored {}% ({:?}), {}/{} optimal nodes hit",
            score.efficiency, score.grade, score.nodes_hit, score.optimal_nodes
        );
        score
    }

    fn ensure_idle(&self, action: &'static str) -> Result<(), RoundError> {
        match self.phase {
            RoundPhase::Setup | RoundPhase::Complete => Ok(()),
            RoundPhase::Drawing | RoundPhase::Racing => Err(self.wrong_phase(action)),
        }
    }

    fn ensure_in_area(&self, start: NodeIndex, point: Point<f64>) -> Result<(), RoundError> {
        let Some(origin) = self.graph.node_at(start) else {
            return Err(Error::InvalidNodeIndex.into());
        };
        if Haversine.distance(origin.geometry, point) > self.config.search_radius_km * 1000.0 {
            return Err(Error::OutsideSearchArea.into());
        }
        Ok(())
    }

    fn ensure_node(&self, node: NodeIndex) -> Result<Point<f64>, RoundError> {
        self.graph
            .node_at(node)
            .map(|n| n.geometry)
            .ok_or_else(|| Error::InvalidNodeIndex.into())
    }

    fn deg_distance(&self, a: NodeIndex, b: NodeIndex) -> f64 {
        match (self.graph.node_at(a), self.graph.node_at(b)) {
            (Some(a), Some(b)) => Euclidean.distance(a.geometry, b.geometry),
            _ => f64::INFINITY,
        }
    }

    fn wrong_phase(&self, action: &'static str) -> RoundError {
        RoundError::WrongPhase {
            action,
            phase: self.phase,
        }
    }

    fn endpoints(&self) -> Result<(NodeIndex, NodeIndex), RoundError> {
        self.start.zip(self.end).ok_or(RoundError::MissingEndpoints)
    }

    fn is_game(&self) -> bool {
        !self.player_route.is_empty()
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn graph(&self) -> &Arc<RoadGraph> {
        &self.graph
    }

    pub fn start(&self) -> Option<NodeIndex> {
        self.start
    }

    pub fn end(&self) -> Option<NodeIndex> {
        self.end
    }

    /// Snapped player waypoints, starting with the start node
    pub fn player_route(&self) -> &[NodeIndex] {
        &self.player_route
    }

    pub fn player_path(&self) -> Option<&PlayerPath> {
        self.player_path.as_ref()
    }

    pub fn player_timeline(&self) -> &TimelineScheduler {
        &self.player_timeline
    }

    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    pub fn run_mut(&mut self) -> Option<&mut RunState> {
        self.run.as_mut()
    }

    pub fn score(&self) -> Option<&ScoreResult> {
        self.score.as_ref()
    }
}

fn run_ticks(run: Option<&RunState>) -> usize {
    run.map_or(0, RunState::ticks)
}
