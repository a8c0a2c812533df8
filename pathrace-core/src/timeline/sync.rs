use log::{debug, warn};

use super::{FALLBACK_DURATION_MS, Waypoint};
use crate::Millis;

/// Total duration of a timeline, the largest end time among its segments
pub fn timeline_duration(waypoints: &[Waypoint]) -> Millis {
    waypoints
        .iter()
        .map(|w| w.end_time)
        .fold(0.0, f64::max)
}

/// Retimes `segments` so that together they last exactly `target`.
///
/// Every segment gets the same share of `target` regardless of its length,
/// and the segments are laid out back to back from 0. A zero, negative or
/// non-finite target is replaced by [`FALLBACK_DURATION_MS`]. Calling this
/// again with the same target yields the same boundaries.
///
/// Returns the duration actually applied.
#[allow(clippy::cast_precision_loss)]
pub fn synchronize(segments: &mut [Waypoint], target: Millis) -> Millis {
    let target = if target.is_finite() && target > 0.0 {
        target
    } else {
        warn!("Cannot synchronize to {target} ms, falling back to {FALLBACK_DURATION_MS} ms");
        FALLBACK_DURATION_MS
    };

    let count = segments.len();
    if count == 0 {
        return target;
    }

    let share = target / count as f64;
    for (i, segment) in segments.iter_mut().enumerate() {
        segment.start_time = i as f64 * share;
        segment.end_time = if i + 1 == count {
            target
        } else {
            (i + 1) as f64 * share
        };
    }
    debug!("Synchronized {count} segments to {target:.0} ms, {share:.0} ms each");
    target
}
