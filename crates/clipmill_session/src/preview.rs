//! Preview playback clock.
//!
//! Preview is the one place wall time drives the playhead: each tick moves
//! it forward by the elapsed wall time since the previous tick, so preview
//! speed is real-time regardless of tick cadence. Export never uses this;
//! its clock is derived purely from frame indices.

use clipmill_core::model::Project;
use clipmill_core::types::TimeUs;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct PreviewClock {
    last_tick: Option<Instant>,
}

impl PreviewClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the project's playhead by the wall time elapsed since the
    /// last tick. Pauses at the end of the timeline.
    ///
    /// When the project is paused the clock re-arms, so resuming never
    /// jumps by the paused interval.
    pub fn tick(&mut self, project: &mut Project, now: Instant) {
        if !project.is_playing() {
            self.last_tick = None;
            return;
        }
        let Some(last) = self.last_tick.replace(now) else {
            return;
        };
        let delta = TimeUs(now.duration_since(last).as_micros() as i64);
        let next = project.playhead_us() + delta;
        if next >= project.duration_us() {
            project.set_playhead(project.duration_us());
            project.set_playing(false);
            self.last_tick = None;
        } else {
            project.set_playhead(next);
        }
    }
}
