use std::sync::Arc;

use log::{debug, trace};
use petgraph::{Direction, graph::NodeIndex};

use super::{
    SearchScratch, SearchSide, SearchStatus, StepUpdate, StepwiseSearch, TouchedNode,
    check_endpoints, state::Frontier,
};
use crate::{Error, RoadGraph};

/// Two alternating A* frontiers, one from each endpoint.
///
/// The forward frontier writes `parent`, the backward one writes
/// `prev_parent` and walks edges against their direction. The first node
/// closed by both frontiers is the meeting node. On meeting, the backward
/// chain is spliced onto the forward one so that following `parent` from the
/// end node yields the whole path.
#[derive(Debug, Clone)]
pub struct BidirectionalSearch {
    graph: Arc<RoadGraph>,
    scratch: SearchScratch,
    forward: Frontier,
    backward: Frontier,
    turn: SearchSide,
    endpoints: Option<(NodeIndex, NodeIndex)>,
    meeting: Option<NodeIndex>,
    status: SearchStatus,
    steps: usize,
}

impl Default for BidirectionalSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl BidirectionalSearch {
    pub fn new() -> Self {
        Self {
            graph: Arc::default(),
            scratch: SearchScratch::default(),
            forward: Frontier::default(),
            backward: Frontier::default(),
            turn: SearchSide::Forward,
            endpoints: None,
            meeting: None,
            status: SearchStatus::Idle,
            steps: 0,
        }
    }

    pub fn meeting_node(&self) -> Option<NodeIndex> {
        self.meeting
    }

    fn frontier(&mut self, side: SearchSide) -> &mut Frontier {
        match side {
            SearchSide::Forward => &mut self.forward,
            SearchSide::Backward => &mut self.backward,
        }
    }

    fn estimate(&self, node: NodeIndex, target: NodeIndex) -> f64 {
        match (self.graph.node_at(node), self.graph.node_at(target)) {
            (Some(a), Some(b)) => a.distance_m(b),
            _ => 0.0,
        }
    }

    fn finish(&mut self, meeting: Option<NodeIndex>) {
        self.meeting = meeting;
        self.status = SearchStatus::Finished;
        match meeting {
            Some(node) => {
                debug!(
                    "Frontiers met at node index {} after {} steps",
                    node.index(),
                    self.steps
                );
                self.splice(node);
            }
            None => debug!("Frontier exhausted after {} steps, no path", self.steps),
        }
    }

    /// Re-links the backward chain `meeting -> ... -> end` through `parent`
    fn splice(&mut self, meeting: NodeIndex) {
        let mut referer = meeting;
        let mut cost = self.scratch.cost(meeting);
        while let Some(next) = self.scratch.prev_parent(referer) {
            if let Some(edge) = self.graph.edge_between(referer, next) {
                cost += edge.cost;
            }
            let scratch = self.scratch.node_mut(next);
            scratch.parent = Some(referer);
            scratch.cost = cost;
            referer = next;
        }
    }
}

impl StepwiseSearch for BidirectionalSearch {
    fn start(
        &mut self,
        graph: Arc<RoadGraph>,
        start: NodeIndex,
        end: NodeIndex,
    ) -> Result<(), Error> {
        check_endpoints(&graph, start, end)?;

        let node_count = graph.node_count();
        self.scratch = SearchScratch::new(node_count, graph.edge_count());
        self.forward = Frontier::new(node_count);
        self.backward = Frontier::new(node_count);
        self.graph = graph;
        self.endpoints = Some((start, end));
        self.turn = SearchSide::Forward;
        self.meeting = None;
        self.steps = 0;

        let estimate = self.estimate(start, end);
        let seed = self.scratch.node_mut(start);
        seed.cost = 0.0;
        seed.estimate = estimate;
        self.forward.relax(start, 0.0, estimate);
        self.backward.relax(end, 0.0, estimate);
        self.status = SearchStatus::Running;
        Ok(())
    }

    fn next_step(&mut self) -> StepUpdate {
        let Some((start, end)) = self.endpoints.filter(|_| self.status == SearchStatus::Running)
        else {
            return StepUpdate {
                finished: self.is_finished(),
                ..StepUpdate::default()
            };
        };
        self.steps += 1;

        let side = self.turn;
        self.turn = side.opposite();
        let (direction, target) = match side {
            SearchSide::Forward => (Direction::Outgoing, end),
            SearchSide::Backward => (Direction::Incoming, start),
        };

        let Some((current, cost)) = self.frontier(side).pop() else {
            self.finish(None);
            return StepUpdate::finished();
        };
        self.scratch.mark_visited(current);

        let single_node = side == SearchSide::Forward && current == end;
        if single_node || self.frontier(side.opposite()).is_closed(current) {
            self.finish(Some(current));
            return StepUpdate {
                expanded: Some(current),
                touched: Vec::new(),
                finished: true,
            };
        }

        let graph = Arc::clone(&self.graph);
        let mut touched = Vec::new();
        for neighbor in graph.neighbors(current, direction) {
            if self.frontier(side).is_closed(neighbor.node) {
                continue;
            }

            let tentative = cost + neighbor.cost;
            let estimate = self.estimate(neighbor.node, target);
            if !self
                .frontier(side)
                .relax(neighbor.node, tentative, tentative + estimate)
            {
                continue;
            }

            self.scratch.mark_edge(neighbor.edge);
            let scratch = self.scratch.node_mut(neighbor.node);
            match side {
                SearchSide::Forward => {
                    scratch.parent = Some(current);
                    scratch.cost = tentative;
                    scratch.estimate = estimate;
                }
                SearchSide::Backward => scratch.prev_parent = Some(current),
            }
            touched.push(TouchedNode {
                node: neighbor.node,
                referer: current,
                side,
            });
        }
        trace!(
            "{side:?} frontier expanded node index {}, touched {}",
            current.index(),
            touched.len()
        );

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
