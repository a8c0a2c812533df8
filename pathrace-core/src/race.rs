//! One animated exploration attempt
//!
//! A [`RunState`] owns everything a run mutates: the search, its timeline,
//! the playback clock and the route tracers. Resetting a run means building
//! a new one.

use std::sync::Arc;

use log::{debug, info};
use petgraph::graph::NodeIndex;

use crate::{
    Error, Millis, RoadGraph,
    loading::RaceConfig,
    scoring::{MAX_PATH_STEPS, ScoringEngine},
    search::{ParentLink, RouteTrace, SearchAlgorithm, StepUpdate, StepwiseSearch},
    timeline::{PlaybackController, SegmentKind, TimelineScheduler},
};

#[derive(Debug, Clone)]
pub struct RunState {
    algorithm: SearchAlgorithm,
    timeline: TimelineScheduler,
    playback: PlaybackController,
    traces: Option<Vec<RouteTrace>>,
    animation_speed: u32,
    route_multiplier: f64,
    finished: bool,
    ticks: usize,
}

impl RunState {
    /// Starts a fresh search from `start` to `end`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an invalid configuration and
    /// [`Error::InvalidNodeIndex`] if an endpoint is not in `graph`.
    pub fn new(
        graph: Arc<RoadGraph>,
        config: &RaceConfig,
        start: NodeIndex,
        end: NodeIndex,
    ) -> Result<Self, Error> {
        config.validate()?;
        let algorithm = SearchAlgorithm::started(config.algorithm, graph, start, end)?;
        info!(
            "Starting {} run over {} nodes",
            config.algorithm,
            algorithm.graph().node_count()
        );

        Ok(Self {
            algorithm,
            timeline: TimelineScheduler::new(),
            playback: PlaybackController::live(f64::from(config.animation_speed)),
            traces: None,
            animation_speed: config.animation_speed,
            route_multiplier: config.route_time_multiplier(),
            finished: false,
            ticks: 0,
        })
    }

    /// Advances the run by one frame of `delta_ms`.
    ///
    /// Performs `animation_speed` units of work (search steps, then route
    /// trace steps once the search finished), then moves the clock. Once
    /// finished, only the replay clock moves. Returns whether the run is
    /// finished.
    pub fn tick(&mut self, delta_ms: Millis) -> bool {
        self.ticks += 1;
        if self.finished {
            self.playback.advance(delta_ms);
            return true;
        }

        for _ in 0..self.animation_speed {
            if !self.algorithm.is_finished() {
                let update = self.algorithm.next_step();
                self.schedule_exploration(&update);
            } else if !self.trace_route() {
                break;
            }
        }

        self.playback.set_timer(self.timeline.timer());
        self.playback.advance(delta_ms);

        if self.algorithm.is_finished() && self.traces_done() && self.playback.caught_up() {
            self.finished = true;
            self.playback.finish_live(self.timeline.timer());
            info!(
                "Run finished after {} ticks: {} segments over {:.0} ms, path found: {}",
                self.ticks,
                self.timeline.len(),
                self.timeline.timer(),
                self.algorithm.path_found()
            );
        }
        self.finished
    }

    fn schedule_exploration(&mut self, update: &StepUpdate) {
        let graph = self.algorithm.graph();
        for touched in &update.touched {
            if let (Some(from), Some(to)) = (graph.node_at(touched.referer), graph.node_at(touched.node))
            {
                self.timeline.add_segment(from, to, SegmentKind::Path);
            }
        }
    }

    /// Schedules one segment per active route tracer, returns `false` when
    /// there was nothing left to trace
    fn trace_route(&mut self) -> bool {
        let traces = self.traces.get_or_insert_with(|| {
            let traces = route_traces(&self.algorithm);
            debug!("Tracing route with {} walkers", traces.len());
            traces
        });

        let mut traced = false;
        for trace in traces.iter_mut() {
            let Some((node, referer)) = trace.next_segment(self.algorithm.scratch()) else {
                continue;
            };
            let graph = self.algorithm.graph();
            if let (Some(from), Some(to)) = (graph.node_at(node), graph.node_at(referer)) {
                self.timeline
                    .add_scaled_segment(from, to, SegmentKind::Route, self.route_multiplier);
                traced = true;
            }
        }
        traced
    }

    fn traces_done(&self) -> bool {
        match &self.traces {
            Some(traces) => traces.iter().all(RouteTrace::is_done),
            None => !self.algorithm.path_found(),
        }
    }

    pub fn algorithm(&self) -> &SearchAlgorithm {
        &self.algorithm
    }

    pub fn timeline(&self) -> &TimelineScheduler {
        &self.timeline
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackController {
        &mut self.playback
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn path_found(&self) -> bool {
        self.algorithm.path_found()
    }

    /// Current clock value
    pub fn time(&self) -> Millis {
        self.playback.time()
    }

    /// Largest scheduled end time
    pub fn timer(&self) -> Millis {
        self.timeline.timer()
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Optimal path start -> end, empty while none is known
    pub fn optimal_path(&self) -> Vec<NodeIndex> {
        match self.algorithm.endpoints() {
            Some((_, end)) if self.algorithm.is_finished() => {
                ScoringEngine::default().optimal_path(self.algorithm.scratch(), end)
            }
            _ => Vec::new(),
        }
    }
}

/// Walkers of the final route: back from the end node, or outwards from the
/// meeting node of a bidirectional search (one towards each endpoint)
fn route_traces(algorithm: &SearchAlgorithm) -> Vec<RouteTrace> {
    if !algorithm.path_found() {
        return Vec::new();
    }
    match (algorithm.meeting_node(), algorithm.endpoints()) {
        (Some(meeting), _) => vec![
            RouteTrace::new(meeting, ParentLink::Parent, MAX_PATH_STEPS),
            RouteTrace::new(meeting, ParentLink::PrevParent, MAX_PATH_STEPS),
        ],
        (None, Some((_, end))) => vec![RouteTrace::new(end, ParentLink::Parent, MAX_PATH_STEPS)],
        (None, None) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{AlgorithmKind, test_graphs::*};

    fn run(kind: AlgorithmKind, graph: RoadGraph, from: i64, to: i64) -> RunState {
        let graph = Arc::new(graph);
        let start = graph.node_index(from).unwrap();
        let end = graph.node_index(to).unwrap();
        let config = RaceConfig {
            algorithm: kind,
            animation_speed: 3,
            ..RaceConfig::default()
        };
        RunState::new(graph, &config, start, end).unwrap()
    }

    fn drive(state: &mut RunState) {
        for _ in 0..10_000 {
            if state.tick(16.0) {
                return;
            }
        }
        panic!("run did not finish");
    }

    #[test]
    fn run_finishes_with_route_segments() {
        let mut state = run(AlgorithmKind::AStar, line(8), 1, 8);
        drive(&mut state);

        assert!(state.path_found());
        assert_eq!(state.timeline().count(SegmentKind::Route), 7);
        assert_eq!(state.timeline().count(SegmentKind::Path), 7);
        assert!(state.time() >= state.timer() - 1e-9);
        assert_eq!(state.optimal_path().len(), 8);

        let route: Vec<_> = state
            .timeline()
            .waypoints()
            .iter()
            .filter(|w| w.kind == SegmentKind::Route)
            .collect();
        // traced backwards from the end node, stretched by log2(speed)
        assert_eq!(route[0].from, state.algorithm().graph().node(8).unwrap().lon_lat());
        let expected = 0.001 * crate::timeline::TIME_DENSITY * 3f64.log2();
        assert!((route[0].duration() - expected).abs() < 1e-6);
    }

    #[test]
    fn bidirectional_traces_both_halves() {
        let mut state = run(AlgorithmKind::Bidirectional, line(10), 1, 10);
        drive(&mut state);
        // five edges back to the start, four forward to the end
        assert_eq!(state.timeline().count(SegmentKind::Route), 9);
        assert_eq!(state.optimal_path().len(), 10);
    }

    #[test]
    fn unreachable_target_still_finishes() {
        let mut graph = line(4);
        graph.add_node(77, 0.3, 0.3);
        let mut state = run(AlgorithmKind::Dijkstra, graph, 1, 77);
        drive(&mut state);

        assert!(!state.path_found());
        assert_eq!(state.timeline().count(SegmentKind::Route), 0);
        assert!(state.optimal_path().is_empty());
    }

    #[test]
    fn segments_follow_the_clock() {
        let mut state = run(AlgorithmKind::Greedy, grid(5), 0, 24);
        drive(&mut state);
        let waypoints = state.timeline().waypoints();
        for pair in waypoints.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
        }
        assert_eq!(waypoints.last().unwrap().end_time, state.timer());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let graph = Arc::new(line(2));
        let config = RaceConfig {
            animation_speed: 0,
            ..RaceConfig::default()
        };
        let result = RunState::new(graph, &config, NodeIndex::new(0), NodeIndex::new(1));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn finished_run_replays() {
        let mut state = run(AlgorithmKind::AStar, line(4), 1, 4);
        drive(&mut state);
        state.playback_mut().restart();
        state.tick(10.0);
        assert!(state.time() > 0.0);
        assert!(state.time() < state.timer());
    }
}
