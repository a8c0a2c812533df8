//! Animation timeline.
//!
//! Search events become timed segments whose duration is proportional to
//! their geometric length. A player's timeline is retimed to the duration of
//! the algorithm's so both finish together, and a playback clock decides
//! which segments are drawn.

mod playback;
mod scheduler;
mod sync;
mod waypoint;

pub use playback::{PlaybackController, PlaybackDirection, PlaybackMode, REPLAY_SPEED};
pub use scheduler::TimelineScheduler;
pub use sync::{synchronize, timeline_duration};
pub use waypoint::{SegmentKind, Waypoint};

use crate::Millis;

/// Milliseconds of animation per degree of straight-line lon/lat distance
pub const TIME_DENSITY: f64 = 50_000.0;

/// Duration used when there is no usable target to synchronize to
pub const FALLBACK_DURATION_MS: Millis = 5_000.0;
