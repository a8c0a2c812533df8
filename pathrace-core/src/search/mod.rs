//! Stepwise graph search.
//!
//! Every algorithm is a small state machine (`Idle -> Running -> Finished`)
//! advanced one unit of work per [`StepwiseSearch::next_step`] call, so a
//! frame-driven caller can animate it. "No path" is a normal outcome: the
//! search finishes and the end node keeps no parent.

mod best_first;
mod bidirectional;
mod path;
mod state;

use std::{fmt, str::FromStr, sync::Arc};

use log::{debug, warn};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

pub use best_first::{BestFirstSearch, Priority};
pub use bidirectional::BidirectionalSearch;
pub use path::{ParentLink, RouteTrace, reconstruct_path};
pub use state::{NodeScratch, SearchScratch};

use crate::{Error, MAX_SEARCH_STEPS, RoadGraph};

/// Search algorithm selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    #[default]
    #[serde(alias = "a_star", alias = "a*")]
    AStar,
    Dijkstra,
    Greedy,
    Bidirectional,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 4] = [
        AlgorithmKind::AStar,
        AlgorithmKind::Dijkstra,
        AlgorithmKind::Greedy,
        AlgorithmKind::Bidirectional,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlgorithmKind::AStar => "astar",
            AlgorithmKind::Dijkstra => "dijkstra",
            AlgorithmKind::Greedy => "greedy",
            AlgorithmKind::Bidirectional => "bidirectional",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "astar" | "a_star" | "a*" => Ok(AlgorithmKind::AStar),
            "dijkstra" => Ok(AlgorithmKind::Dijkstra),
            "greedy" => Ok(AlgorithmKind::Greedy),
            "bidirectional" => Ok(AlgorithmKind::Bidirectional),
            other => Err(Error::InvalidConfig(format!("unknown algorithm '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Frontier that touched a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSide {
    Forward,
    Backward,
}

impl SearchSide {
    pub fn opposite(self) -> Self {
        match self {
            SearchSide::Forward => SearchSide::Backward,
            SearchSide::Backward => SearchSide::Forward,
        }
    }
}

/// A node whose referer was set during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchedNode {
    pub node: NodeIndex,
    pub referer: NodeIndex,
    pub side: SearchSide,
}

/// Changes made by one search step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepUpdate {
    /// Node taken off the open set this step
    pub expanded: Option<NodeIndex>,
    pub touched: Vec<TouchedNode>,
    pub finished: bool,
}

impl StepUpdate {
    pub(crate) fn finished() -> Self {
        Self {
            expanded: None,
            touched: Vec::new(),
            finished: true,
        }
    }

    /// `true` if the step changed nothing
    pub fn is_empty(&self) -> bool {
        self.expanded.is_none() && self.touched.is_empty()
    }
}

/// Result of a synchronous search run
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found {
        path: Vec<NodeIndex>,
        cost: f64,
        steps: usize,
    },
    Unreachable {
        steps: usize,
    },
    BudgetExceeded {
        steps: usize,
    },
}

impl SearchOutcome {
    pub fn path(&self) -> Option<&[NodeIndex]> {
        match self {
            SearchOutcome::Found { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn steps(&self) -> usize {
        match self {
            SearchOutcome::Found { steps, .. }
            | SearchOutcome::Unreachable { steps }
            | SearchOutcome::BudgetExceeded { steps } => *steps,
        }
    }
}

/// Shared capability of all search algorithms
pub trait StepwiseSearch {
    /// Resets all scratch state and seeds the frontier with `start`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIndex`] if either endpoint is not in `graph`.
    fn start(
        &mut self,
        graph: Arc<RoadGraph>,
        start: NodeIndex,
        end: NodeIndex,
    ) -> Result<(), Error>;

    /// Performs one unit of search work. A no-op on a finished search.
    fn next_step(&mut self) -> StepUpdate;

    fn status(&self) -> SearchStatus;

    fn scratch(&self) -> &SearchScratch;

    fn graph(&self) -> &RoadGraph;

    /// `(start, end)` of the current run
    fn endpoints(&self) -> Option<(NodeIndex, NodeIndex)>;

    /// Number of steps that did work in the current run
    fn steps(&self) -> usize;

    fn is_finished(&self) -> bool {
        self.status() == SearchStatus::Finished
    }

    /// `true` once the search finished with a parent chain from end to start
    fn path_found(&self) -> bool {
        match self.endpoints() {
            Some((start, end)) => {
                self.is_finished() && (start == end || self.scratch().parent(end).is_some())
            }
            None => false,
        }
    }

    /// Steps the search until it finishes or `budget` steps were spent.
    fn run_to_completion(&mut self, budget: usize) -> SearchOutcome {
        let Some((_, end)) = self.endpoints() else {
            return SearchOutcome::Unreachable { steps: 0 };
        };

        while !self.is_finished() {
            if self.steps() >= budget {
                warn!("Search gave up after {budget} steps");
                return SearchOutcome::BudgetExceeded {
                    steps: self.steps(),
                };
            }
            self.next_step();
        }

        let steps = self.steps();
        if !self.path_found() {
            debug!("Search finished after {steps} steps without reaching the target");
            return SearchOutcome::Unreachable { steps };
        }

        match reconstruct_path(self.scratch(), end, budget.max(self.graph().node_count())) {
            Ok(path) => SearchOutcome::Found {
                path,
                cost: self.scratch().cost(end),
                steps,
            },
            Err(Error::StepBudgetExceeded(_)) => SearchOutcome::BudgetExceeded { steps },
            Err(e) => {
                warn!("Discarding search result: {e}");
                SearchOutcome::Unreachable { steps }
            }
        }
    }
}

macro_rules! dispatch {
    ($algorithm:expr, $search:ident => $body:expr) => {
        match $algorithm {
            SearchAlgorithm::AStar($search)
            | SearchAlgorithm::Dijkstra($search)
            | SearchAlgorithm::Greedy($search) => $body,
            SearchAlgorithm::Bidirectional($search) => $body,
        }
    };
}

/// Closed set of algorithms, dispatched by match
#[derive(Debug, Clone)]
pub enum SearchAlgorithm {
    AStar(BestFirstSearch),
    Dijkstra(BestFirstSearch),
    Greedy(BestFirstSearch),
    Bidirectional(BidirectionalSearch),
}

impl SearchAlgorithm {
    pub fn new(kind: AlgorithmKind) -> Self {
        match kind {
            AlgorithmKind::AStar => {
                SearchAlgorithm::AStar(BestFirstSearch::new(Priority::CostPlusHeuristic))
            }
            AlgorithmKind::Dijkstra => {
                SearchAlgorithm::Dijkstra(BestFirstSearch::new(Priority::CostOnly))
            }
            AlgorithmKind::Greedy => {
                SearchAlgorithm::Greedy(BestFirstSearch::new(Priority::HeuristicOnly))
            }
            AlgorithmKind::Bidirectional => {
                SearchAlgorithm::Bidirectional(BidirectionalSearch::new())
            }
        }
    }

    /// Builds an algorithm and starts it right away
    ///
    /// # Errors
    ///
    /// See [`StepwiseSearch::start`].
    pub fn started(
        kind: AlgorithmKind,
        graph: Arc<RoadGraph>,
        start: NodeIndex,
        end: NodeIndex,
    ) -> Result<Self, Error> {
        let mut algorithm = Self::new(kind);
        algorithm.start(graph, start, end)?;
        Ok(algorithm)
    }

    pub fn kind(&self) -> AlgorithmKind {
        match self {
            SearchAlgorithm::AStar(_) => AlgorithmKind::AStar,
            SearchAlgorithm::Dijkstra(_) => AlgorithmKind::Dijkstra,
            SearchAlgorithm::Greedy(_) => AlgorithmKind::Greedy,
            SearchAlgorithm::Bidirectional(_) => AlgorithmKind::Bidirectional,
        }
    }

    /// Node where the two frontiers of a bidirectional search met
    pub fn meeting_node(&self) -> Option<NodeIndex> {
        match self {
            SearchAlgorithm::Bidirectional(search) => search.meeting_node(),
            _ => None,
        }
    }
}

impl StepwiseSearch for SearchAlgorithm {
    fn start(
        &mut self,
        graph: Arc<RoadGraph>,
        start: NodeIndex,
        end: NodeIndex,
    ) -> Result<(), Error> {
        debug!("Starting {} search", self.kind());
        dispatch!(self, s => s.start(graph, start, end))
    }

    fn next_step(&mut self) -> StepUpdate {
        dispatch!(self, s => s.next_step())
    }

    fn status(&self) -> SearchStatus {
        dispatch!(self, s => s.status())
    }

    fn scratch(&self) -> &SearchScratch {
        dispatch!(self, s => s.scratch())
    }

    fn graph(&self) -> &RoadGraph {
        dispatch!(self, s => s.graph())
    }

    fn endpoints(&self) -> Option<(NodeIndex, NodeIndex)> {
        dispatch!(self, s => s.endpoints())
    }

    fn steps(&self) -> usize {
        dispatch!(self, s => s.steps())
    }
}

/// Summary of one synchronous search run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchStats {
    pub algorithm: AlgorithmKind,
    pub steps: usize,
    /// Distinct nodes taken off an open set
    pub explored: usize,
    pub found: bool,
    pub budget_exceeded: bool,
    pub path_nodes: usize,
    pub path_cost: Option<f64>,
    pub path_length_meters: Option<f64>,
}

impl SearchStats {
    pub fn from_outcome(algorithm: &SearchAlgorithm, outcome: &SearchOutcome) -> Self {
        let (path_cost, path_length_meters) = match outcome {
            SearchOutcome::Found { path, cost, .. } => {
                (Some(*cost), Some(algorithm.graph().path_length_m(path)))
            }
            _ => (None, None),
        };
        Self {
            algorithm: algorithm.kind(),
            steps: outcome.steps(),
            explored: algorithm.scratch().visited_count(),
            found: outcome.path().is_some(),
            budget_exceeded: matches!(outcome, SearchOutcome::BudgetExceeded { .. }),
            path_nodes: outcome.path().map_or(0, <[NodeIndex]>::len),
            path_cost,
            path_length_meters,
        }
    }
}

/// Runs `kind` from `start` to `end` with the default step ceiling
///
/// # Errors
///
/// See [`StepwiseSearch::start`].
pub fn shortest_path(
    graph: Arc<RoadGraph>,
    kind: AlgorithmKind,
    start: NodeIndex,
    end: NodeIndex,
) -> Result<(SearchAlgorithm, SearchOutcome), Error> {
    let mut algorithm = SearchAlgorithm::started(kind, graph, start, end)?;
    let outcome = algorithm.run_to_completion(MAX_SEARCH_STEPS);
    Ok((algorithm, outcome))
}

/// Validates that both endpoints exist in `graph`
pub(crate) fn check_endpoints(
    graph: &RoadGraph,
    start: NodeIndex,
    end: NodeIndex,
) -> Result<(), Error> {
    if graph.contains(start) && graph.contains(end) {
        Ok(())
    } else {
        Err(Error::InvalidNodeIndex)
    }
}


#[cfg(test)]
mod tests {
    use super::{test_graphs::*, *};

    fn run(kind: AlgorithmKind, graph: &Arc<RoadGraph>, from: i64, to: i64) -> SearchOutcome {
        let start = graph.node_index(from).unwrap();
        let end = graph.node_index(to).unwrap();
        let mut algorithm = SearchAlgorithm::started(kind, Arc::clone(graph), start, end).unwrap();
        algorithm.run_to_completion(MAX_SEARCH_STEPS)
    }

    fn ids(graph: &RoadGraph, path: &[NodeIndex]) -> Vec<i64> {
        path.iter().map(|&n| graph.node_at(n).unwrap().id).collect()
    }

    #[test]
    fn kind_parses_and_displays() {
        assert_eq!("AStar".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::AStar);
        assert_eq!(
            serde_json::from_str::<AlgorithmKind>("\"bidirectional\"").unwrap(),
            AlgorithmKind::Bidirectional
        );
        assert_eq!(AlgorithmKind::Greedy.to_string(), "greedy");
        assert!("bfs".parse::<AlgorithmKind>().is_err());
    }

    #[test]
    fn dijkstra_and_astar_agree_on_cost() {
        let graph = Arc::new(grid(8));
        for (from, to) in [(0, 63), (7, 56), (9, 46), (60, 3)] {
            let SearchOutcome::Found { cost: dijkstra, .. } =
                run(AlgorithmKind::Dijkstra, &graph, from, to)
            else {
                panic!("dijkstra found no path");
            };
            let SearchOutcome::Found { cost: astar, .. } =
                run(AlgorithmKind::AStar, &graph, from, to)
            else {
                panic!("astar found no path");
            };
            assert!((dijkstra - astar).abs() < 1e-6, "{from}->{to}: {dijkstra} vs {astar}");
        }
    }

    #[test]
    fn every_algorithm_reaches_the_end() {
        let graph = Arc::new(grid(6));
        for kind in AlgorithmKind::ALL {
            let outcome = run(kind, &graph, 0, 35);
            let path = outcome.path().unwrap_or_else(|| panic!("{kind} found no path"));
            let ids = ids(&graph, path);
            assert_eq!(ids.first(), Some(&0));
            assert_eq!(ids.last(), Some(&35));
        }
    }

    #[test]
    fn disconnected_end_finishes_without_parent() {
        let mut graph = line(3);
        graph.add_node(99, 1.0, 1.0);
        let graph = Arc::new(graph);
        for kind in AlgorithmKind::ALL {
            let start = graph.node_index(1).unwrap();
            let end = graph.node_index(99).unwrap();
            let mut algorithm = SearchAlgorithm::started(kind, Arc::clone(&graph), start, end).unwrap();
            let outcome = algorithm.run_to_completion(MAX_SEARCH_STEPS);

            assert!(matches!(outcome, SearchOutcome::Unreachable { .. }), "{kind}");
            assert!(algorithm.is_finished());
            assert_eq!(algorithm.scratch().parent(end), None);
            assert!(!algorithm.path_found());
        }
    }

    #[test]
    fn budget_stops_a_synchronous_run() {
        let graph = Arc::new(line(50));
        let start = graph.node_index(1).unwrap();
        let end = graph.node_index(50).unwrap();
        let mut algorithm =
            SearchAlgorithm::started(AlgorithmKind::Dijkstra, graph, start, end).unwrap();
        assert_eq!(
            algorithm.run_to_completion(10),
            SearchOutcome::BudgetExceeded { steps: 10 }
        );
        assert!(!algorithm.is_finished());
    }

    #[test]
    fn next_step_after_finish_is_empty() {
        let graph = Arc::new(line(4));
        for kind in AlgorithmKind::ALL {
            let start = graph.node_index(1).unwrap();
            let end = graph.node_index(4).unwrap();
            let mut algorithm = SearchAlgorithm::started(kind, Arc::clone(&graph), start, end).unwrap();
            algorithm.run_to_completion(MAX_SEARCH_STEPS);
            let steps = algorithm.steps();

            let update = algorithm.next_step();
            assert!(update.is_empty());
            assert!(update.finished);
            assert_eq!(algorithm.steps(), steps);
        }
    }

    #[test]
    fn idle_search_does_nothing() {
        let mut algorithm = SearchAlgorithm::new(AlgorithmKind::AStar);
        assert_eq!(algorithm.status(), SearchStatus::Idle);
        assert!(algorithm.next_step().is_empty());
        assert_eq!(
            algorithm.run_to_completion(10),
            SearchOutcome::Unreachable { steps: 0 }
        );
    }

    #[test]
    fn start_rejects_foreign_nodes() {
        let graph = Arc::new(line(3));
        let mut algorithm = SearchAlgorithm::new(AlgorithmKind::Bidirectional);
        assert_eq!(
            algorithm.start(graph, NodeIndex::new(0), NodeIndex::new(42)),
            Err(Error::InvalidNodeIndex)
        );
    }

    #[test]
    fn stats_summarize_outcome() {
        let graph = Arc::new(line(5));
        let start = graph.node_index(1).unwrap();
        let end = graph.node_index(5).unwrap();
        let (algorithm, outcome) =
            shortest_path(Arc::clone(&graph), AlgorithmKind::AStar, start, end).unwrap();
        let stats = SearchStats::from_outcome(&algorithm, &outcome);

        assert!(stats.found);
        assert_eq!(stats.path_nodes, 5);
        assert_eq!(stats.explored, 5);
        let length = stats.path_length_meters.unwrap();
        assert!((length - 444.8).abs() < 1.0, "{length}");
        assert!((stats.path_cost.unwrap() - length).abs() < 1e-6);
    }
}
