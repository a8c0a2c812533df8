use serde::{Deserialize, Serialize};

use crate::Millis;

/// Rendering category of a timed segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Edge explored by a search
    Path,
    /// Edge of the final route, traced back from the end node
    Route,
    /// Edge of a player-drawn route
    Player,
}

/// A directed segment between two `[lon, lat]` points, timed on the run clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub from: [f64; 2],
    pub to: [f64; 2],
    pub start_time: Millis,
    pub end_time: Millis,
    #[serde(rename = "category")]
    pub kind: SegmentKind,
}

impl Waypoint {
    pub fn duration(&self) -> Millis {
        self.end_time - self.start_time
    }

    /// `true` while `time` lies within `[start_time, end_time]`
    pub fn is_active(&self, time: Millis) -> bool {
        self.start_time <= time && time <= self.end_time
    }

    /// Drawn fraction of the segment at `time`, clamped to `[0, 1]`
    pub fn progress_at(&self, time: Millis) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return if time >= self.start_time { 1.0 } else { 0.0 };
        }
        ((time - self.start_time) / duration).clamp(0.0, 1.0)
    }

    /// Interpolated head of the segment at `time`
    pub fn position_at(&self, time: Millis) -> [f64; 2] {
        let t = self.progress_at(time);
        [
            self.from[0] + (self.to[0] - self.from[0]) * t,
            self.from[1] + (self.to[1] - self.from[1]) * t,
        ]
    }
}
