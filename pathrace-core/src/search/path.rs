use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;

use super::SearchScratch;
use crate::Error;

/// Walks parent pointers back from `end` and returns the path start -> end.
///
/// A node without a parent yields a single-node path; callers check that a
/// path was actually found before relying on the result.
///
/// # Errors
///
/// Returns [`Error::GraphIntegrity`] when the parent chain loops and
/// [`Error::StepBudgetExceeded`] when it is longer than `max_steps`.
pub fn reconstruct_path(
    scratch: &SearchScratch,
    end: NodeIndex,
    max_steps: usize,
) -> Result<Vec<NodeIndex>, Error> {
    if scratch.get(end).is_none() {
        return Err(Error::InvalidNodeIndex);
    }

    let mut seen = FixedBitSet::with_capacity(scratch.len());
    seen.insert(end.index());
    let mut path = vec![end];
    let mut node = end;

    while let Some(parent) = scratch.parent(node) {
        if path.len() > max_steps {
            return Err(Error::StepBudgetExceeded(max_steps));
        }
        if seen.put(parent.index()) {
            return Err(Error::GraphIntegrity(format!(
                "parent chain loops at node index {}",
                parent.index()
            )));
        }
        path.push(parent);
        node = parent;
    }

    path.reverse();
    Ok(path)
}

/// Which referer field a [`RouteTrace`] follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLink {
    Parent,
    PrevParent,
}

/// Stepwise walk along a parent chain, one edge per step.
///
/// Used to animate the final route backwards from the end node (or, for a
/// bidirectional search, outwards from the meeting node).
#[derive(Debug, Clone)]
pub struct RouteTrace {
    current: Option<NodeIndex>,
    link: ParentLink,
    steps: usize,
    max_steps: usize,
}

impl RouteTrace {
    pub fn new(from: NodeIndex, link: ParentLink, max_steps: usize) -> Self {
        Self {
            current: Some(from),
            link,
            steps: 0,
            max_steps,
        }
    }

    /// Next `(node, referer)` pair of the chain, `None` once it is exhausted
    pub fn next_segment(&mut self, scratch: &SearchScratch) -> Option<(NodeIndex, NodeIndex)> {
        let node = self.current?;
        let next = match self.link {
            ParentLink::Parent => scratch.parent(node),
            ParentLink::PrevParent => scratch.prev_parent(node),
        };
        self.steps += 1;
        self.current = next.filter(|_| self.steps < self.max_steps);
        next.map(|referer| (node, referer))
    }

    pub fn is_done(&self) -> bool {
        self.current.is_none()
    }
}
