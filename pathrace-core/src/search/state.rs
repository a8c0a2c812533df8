use std::{cmp::Ordering, collections::BinaryHeap};

use fixedbitset::FixedBitSet;
use petgraph::graph::{EdgeIndex, NodeIndex};

/// Per-run search state of a single node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeScratch {
    /// Cumulative cost from the start node
    pub cost: f64,
    /// Heuristic estimate to the target
    pub estimate: f64,
    pub visited: bool,
    /// Referer on the forward chain
    pub parent: Option<NodeIndex>,
    /// Referer on the backward chain of a bidirectional search
    pub prev_parent: Option<NodeIndex>,
}

impl Default for NodeScratch {
    fn default() -> Self {
        Self {
            cost: f64::INFINITY,
            estimate: 0.0,
            visited: false,
            parent: None,
            prev_parent: None,
        }
    }
}

/// Arena of node scratch state, indexed by `NodeIndex`.
///
/// A fresh arena is built on every search start, so no state leaks from one
/// run into the next.
#[derive(Debug, Clone, Default)]
pub struct SearchScratch {
    nodes: Vec<NodeScratch>,
    explored_edges: FixedBitSet,
    visited_count: usize,
}

impl SearchScratch {
    pub fn new(node_count: usize, edge_count: usize) -> Self {
        Self {
            nodes: vec![NodeScratch::default(); node_count],
            explored_edges: FixedBitSet::with_capacity(edge_count),
            visited_count: 0,
        }
    }

    pub fn get(&self, node: NodeIndex) -> Option<&NodeScratch> {
        self.nodes.get(node.index())
    }

    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.get(node).and_then(|s| s.parent)
    }

    pub fn prev_parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.get(node).and_then(|s| s.prev_parent)
    }

    pub fn cost(&self, node: NodeIndex) -> f64 {
        self.get(node).map_or(f64::INFINITY, |s| s.cost)
    }

    pub fn is_visited(&self, node: NodeIndex) -> bool {
        self.get(node).is_some_and(|s| s.visited)
    }

    /// Number of distinct nodes visited during the run
    pub fn visited_count(&self) -> usize {
        self.visited_count
    }

    pub fn is_edge_explored(&self, edge: EdgeIndex) -> bool {
        self.explored_edges.contains(edge.index())
    }

    pub fn explored_edge_count(&self) -> usize {
        self.explored_edges.count_ones(..)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node_mut(&mut self, node: NodeIndex) -> &mut NodeScratch {
        &mut self.nodes[node.index()]
    }

    /// Flags `node` as visited, returns `false` if it already was
    pub(crate) fn mark_visited(&mut self, node: NodeIndex) -> bool {
        let scratch = self.node_mut(node);
        if scratch.visited {
            return false;
        }
        scratch.visited = true;
        self.visited_count += 1;
        true
    }

    pub(crate) fn mark_edge(&mut self, edge: EdgeIndex) {
        self.explored_edges.grow(edge.index() + 1);
        self.explored_edges.insert(edge.index());
    }
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    priority: f64,
    /// First-found order of the node, breaks priority ties
    seq: u64,
    node: NodeIndex,
    cost: f64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

// Min-heap by priority, then by discovery order
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Open and closed sets of one search frontier.
///
/// Improved entries are pushed again; outdated heap entries are skipped
/// when popped.
#[derive(Debug, Clone, Default)]
pub(crate) struct Frontier {
    open: BinaryHeap<QueueEntry>,
    closed: FixedBitSet,
    costs: Vec<f64>,
    first_seen: Vec<Option<u64>>,
    next_seq: u64,
}

impl Frontier {
    pub(crate) fn new(node_count: usize) -> Self {
        Self {
            open: BinaryHeap::new(),
            closed: FixedBitSet::with_capacity(node_count),
            costs: vec![f64::INFINITY; node_count],
            first_seen: vec![None; node_count],
            next_seq: 0,
        }
    }

    /// Records a tentative cost for `node`.
    ///
    /// Returns `true` if the node was newly opened or its cost improved.
    pub(crate) fn relax(&mut self, node: NodeIndex, cost: f64, priority: f64) -> bool {
        let idx = node.index();
        if self.closed.contains(idx) || cost >= self.costs[idx] {
            return false;
        }
        self.costs[idx] = cost;
        let seq = *self.first_seen[idx].get_or_insert_with(|| {
            let seq = self.next_seq;
            self.next_seq += 1;
            seq
        });
        self.open.push(QueueEntry {
            priority,
            seq,
            node,
            cost,
        });
        true
    }

    /// Pops the best open node and closes it
    pub(crate) fn pop(&mut self) -> Option<(NodeIndex, f64)> {
        while let Some(QueueEntry { node, cost, .. }) = self.open.pop() {
            let idx = node.index();
            if self.closed.contains(idx) || cost > self.costs[idx] {
                continue;
            }
            self.closed.insert(idx);
            return Some((node, cost));
        }
        None
    }

    pub(crate) fn is_closed(&self, node: NodeIndex) -> bool {
        self.closed.contains(node.index())
    }
}
