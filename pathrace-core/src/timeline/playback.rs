use serde::Serialize;

use super::Waypoint;
use crate::Millis;

/// Speed factor applied while replaying a completed run
pub const REPLAY_SPEED: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackDirection {
    Forward,
    Reverse,
}

impl PlaybackDirection {
    fn sign(self) -> f64 {
        match self {
            PlaybackDirection::Forward => 1.0,
            PlaybackDirection::Reverse => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Segments are still being scheduled, the bound keeps growing
    Live,
    /// Bounded replay of a completed run
    Replay,
}

/// Shared virtual clock of a run.
///
/// In live mode the clock simply follows the frames. In replay mode it is
/// clamped to `[0, timer]` and stops by itself at either end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackController {
    time: Millis,
    timer: Millis,
    direction: PlaybackDirection,
    speed: f64,
    playing: bool,
    mode: PlaybackMode,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::live(1.0)
    }
}

impl PlaybackController {
    /// Running live controller advancing `speed` ms per frame ms
    pub fn live(speed: f64) -> Self {
        Self {
            time: 0.0,
            timer: 0.0,
            direction: PlaybackDirection::Forward,
            speed,
            playing: true,
            mode: PlaybackMode::Live,
        }
    }

    /// Advances the clock by `delta_ms` of frame time and returns the new time
    pub fn advance(&mut self, delta_ms: Millis) -> Millis {
        if !self.playing || delta_ms <= 0.0 {
            return self.time;
        }

        match self.mode {
            PlaybackMode::Live => {
                self.time = (self.time + delta_ms * self.speed * self.direction.sign()).max(0.0);
            }
            PlaybackMode::Replay => {
                let step = delta_ms * REPLAY_SPEED * self.speed * self.direction.sign();
                self.time = (self.time + step).clamp(0.0, self.timer);
                // only the forward bound stops the replay, reverse play holds at 0
                if self.direction == PlaybackDirection::Forward && self.time >= self.timer {
                    self.playing = false;
                }
            }
        }
        self.time
    }

    /// Switches to bounded replay of `[0, timer]`, paused at the current time
    pub fn finish_live(&mut self, timer: Millis) {
        self.timer = timer.max(0.0);
        self.time = self.time.clamp(0.0, self.timer);
        self.mode = PlaybackMode::Replay;
        self.playing = false;
        self.direction = PlaybackDirection::Forward;
    }

    /// Starts a replay from 0
    pub fn restart(&mut self) {
        self.time = 0.0;
        self.direction = PlaybackDirection::Forward;
        self.playing = true;
    }

    /// Pauses or resumes playback in `direction`.
    ///
    /// A looped forward replay that already reached the end restarts from 0.
    pub fn toggle(&mut self, looped: bool, direction: PlaybackDirection) {
        self.direction = direction;
        if looped
            && self.mode == PlaybackMode::Replay
            && direction == PlaybackDirection::Forward
            && self.time >= self.timer
        {
            self.time = 0.0;
            self.playing = true;
            return;
        }
        self.playing = !self.playing;
    }

    /// Jumps to `fraction` of the bound, clamped to `[0, 1]`
    pub fn seek(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        self.time = self.timer * fraction;
    }

    pub fn progress(&self) -> f64 {
        if self.timer <= 0.0 {
            return 0.0;
        }
        (self.time / self.timer).clamp(0.0, 1.0)
    }

    /// Grows the bound while segments are still being scheduled
    pub fn set_timer(&mut self, timer: Millis) {
        self.timer = timer.max(0.0);
    }

    /// Segments already started at the current time, with their drawn fraction
    pub fn visible_segments<'a>(
        &self,
        waypoints: &'a [Waypoint],
    ) -> impl Iterator<Item = (&'a Waypoint, f64)> + 'a {
        let time = self.time;
        waypoints
            .iter()
            .filter(move |w| w.start_time <= time)
            .map(move |w| (w, w.progress_at(time)))
    }

    /// Segments whose interval contains the current time
    pub fn active_segments<'a>(
        &self,
        waypoints: &'a [Waypoint],
    ) -> impl Iterator<Item = &'a Waypoint> + 'a {
        let time = self.time;
        waypoints.iter().filter(move |w| w.is_active(time))
    }

    pub fn time(&self) -> Millis {
        self.time
    }

    pub fn timer(&self) -> Millis {
        self.timer
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn direction(&self) -> PlaybackDirection {
        self.direction
    }

    /// `true` once the clock reached the bound of its timeline
    pub fn caught_up(&self) -> bool {
        self.time >= self.timer
    }
}
