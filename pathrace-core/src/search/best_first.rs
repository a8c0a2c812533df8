use std::sync::Arc;

use log::trace;
use petgraph::{Direction, graph::NodeIndex};

use super::{
    SearchScratch, SearchSide, SearchStatus, StepUpdate, StepwiseSearch, TouchedNode,
    check_endpoints, state::Frontier,
};
use crate::{Error, RoadGraph};

/// Ordering key of the open set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// `g + h`, A*
    CostPlusHeuristic,
    /// `g`, Dijkstra
    CostOnly,
    /// `h`, greedy best-first
    HeuristicOnly,
}

impl Priority {
    fn of(self, cost: f64, estimate: f64) -> f64 {
        match self {
            Priority::CostPlusHeuristic => cost + estimate,
            Priority::CostOnly => cost,
            Priority::HeuristicOnly => estimate,
        }
    }

    fn uses_heuristic(self) -> bool {
        self != Priority::CostOnly
    }
}

/// Single-frontier best-first search.
///
/// The heuristic is the great-circle distance to the end node in meters. It
/// never overestimates as long as every edge cost is at least its length,
/// which does not hold for the cheaper motorway and trunk classes; A* is
/// therefore only approximately optimal on such networks.
#[derive(Debug, Clone)]
pub struct BestFirstSearch {
    priority: Priority,
    graph: Arc<RoadGraph>,
    scratch: SearchScratch,
    frontier: Frontier,
    endpoints: Option<(NodeIndex, NodeIndex)>,
    status: SearchStatus,
    steps: usize,
}

impl BestFirstSearch {
    pub fn new(priority: Priority) -> Self {
        Self {
            priority,
            graph: Arc::default(),
            scratch: SearchScratch::default(),
            frontier: Frontier::default(),
            endpoints: None,
            status: SearchStatus::Idle,
            steps: 0,
        }
    }

    fn estimate(&self, node: NodeIndex, target: NodeIndex) -> f64 {
        if !self.priority.uses_heuristic() {
            return 0.0;
        }
        match (self.graph.node_at(node), self.graph.node_at(target)) {
            (Some(a), Some(b)) => a.distance_m(b),
            _ => 0.0,
        }
    }

    fn finish(&mut self) {
        self.status = SearchStatus::Finished;
        trace!(
            "Best-first search finished after {} steps, {} nodes visited",
            self.steps,
            self.scratch.visited_count()
        );
    }
}

impl StepwiseSearch for BestFirstSearch {
    fn start(
        &mut self,
        graph: Arc<RoadGraph>,
        start: NodeIndex,
        end: NodeIndex,
    ) -> Result<(), Error> {
        check_endpoints(&graph, start, end)?;

        self.scratch = SearchScratch::new(graph.node_count(), graph.edge_count());
        self.frontier = Frontier::new(graph.node_count());
        self.graph = graph;
        self.endpoints = Some((start, end));
        self.steps = 0;

        let estimate = self.estimate(start, end);
        let seed = self.scratch.node_mut(start);
        seed.cost = 0.0;
        seed.estimate = estimate;
        self.frontier.relax(start, 0.0, self.priority.of(0.0, estimate));
        self.status = SearchStatus::Running;
        Ok(())
    }

    fn next_step(&mut self) -> StepUpdate {
        let Some((_, end)) = self.endpoints.filter(|_| self.status == SearchStatus::Running)
        else {
            return StepUpdate {
                finished: self.is_finished(),
                ..StepUpdate::default()
            };
        };
        self.steps += 1;

        let Some((current, cost)) = self.frontier.pop() else {
            self.finish();
            return StepUpdate::finished();
        };
        self.scratch.mark_visited(current);

        if current == end {
            self.finish();
            return StepUpdate {
                expanded: Some(current),
                touched: Vec::new(),
                finished: true,
            };
        }

        let graph = Arc::clone(&self.graph);
        let mut touched = Vec::new();
        for neighbor in graph.neighbors(current, Direction::Outgoing) {
            if self.frontier.is_closed(neighbor.node) {
                continue;
            }
            self.scratch.mark_edge(neighbor.edge);

            let tentative = cost + neighbor.cost;
            let estimate = self.estimate(neighbor.node, end);
            if self
                .frontier
                .relax(neighbor.node, tentative, self.priority.of(tentative, estimate))
            {
                let scratch = self.scratch.node_mut(neighbor.node);
                scratch.cost = tentative;
                scratch.estimate = estimate;
                scratch.parent = Some(current);
                touched.push(TouchedNode {
                    node: neighbor.node,
                    referer: current,
                    side: SearchSide::Forward,
                });
            }
        }

        StepUpdate {
            expanded: Some(current),
            touched,
            finished: false,
        }
    }

    fn status(&self) -> SearchStatus {
        self.status
    }

    fn scratch(&self) -> &SearchScratch {
        &self.scratch
    }

    fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    fn endpoints(&self) -> Option<(NodeIndex, NodeIndex)> {
        self.endpoints
    }

    fn steps(&self) -> usize {
        self.steps
    }
}
