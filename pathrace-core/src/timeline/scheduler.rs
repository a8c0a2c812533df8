use log::trace;
use serde::Serialize;

use super::{SegmentKind, TIME_DENSITY, Waypoint, sync::synchronize};
use crate::{Millis, RoadNode};

/// Append-only sequence of timed segments on a growing virtual clock
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelineScheduler {
    waypoints: Vec<Waypoint>,
    /// Start time of the next segment
    clock: Millis,
    /// Largest end time scheduled so far
    timer: Millis,
}

impl TimelineScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a timeline walking `nodes` in order with distance-based timing
    pub fn from_route<'a>(nodes: impl IntoIterator<Item = &'a RoadNode>, kind: SegmentKind) -> Self {
        let mut timeline = Self::new();
        let mut nodes = nodes.into_iter();
        if let Some(mut previous) = nodes.next() {
            for node in nodes {
                timeline.add_segment(previous, node, kind);
                previous = node;
            }
        }
        timeline
    }

    /// Appends a segment `from -> to` lasting `distance * TIME_DENSITY`
    pub fn add_segment(&mut self, from: &RoadNode, to: &RoadNode, kind: SegmentKind) -> &Waypoint {
        self.add_scaled_segment(from, to, kind, 1.0)
    }

    /// Same as [`add_segment`](Self::add_segment) with the duration scaled by
    /// `multiplier`
    pub fn add_scaled_segment(
        &mut self,
        from: &RoadNode,
        to: &RoadNode,
        kind: SegmentKind,
        multiplier: f64,
    ) -> &Waypoint {
        let duration = from.distance_deg(to) * TIME_DENSITY * multiplier.max(0.0);
        let start_time = self.clock;
        let end_time = start_time + duration;
        trace!("Scheduling {kind:?} segment {} -> {} at {start_time:.0}..{end_time:.0}", from.id, to.id);

        self.clock = end_time;
        self.timer = self.timer.max(end_time);
        self.waypoints.push(Waypoint {
            from: from.lon_lat(),
            to: to.lon_lat(),
            start_time,
            end_time,
            kind,
        });
        &self.waypoints[self.waypoints.len() - 1]
    }

    /// Retimes every segment to share `target` equally, see [`synchronize`].
    ///
    /// Returns the effective duration.
    pub fn synchronize(&mut self, target: Millis) -> Millis {
        let effective = synchronize(&mut self.waypoints, target);
        self.clock = effective;
        self.timer = effective;
        effective
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn into_waypoints(self) -> Vec<Waypoint> {
        self.waypoints
    }

    pub fn clock(&self) -> Millis {
        self.clock
    }

    pub fn timer(&self) -> Millis {
        self.timer
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn count(&self, kind: SegmentKind) -> usize {
        self.waypoints.iter().filter(|w| w.kind == kind).count()
    }
}
