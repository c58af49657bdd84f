use std::time::{Duration, Instant};

use super::FrameTime;

/// Frame-rate figures averaged over one reporting window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameRate {
    pub fps: f32,
    /// Mean frame duration in milliseconds.
    pub frame_ms: f32,
    pub frames: u32,
}

/// Accumulates frame durations and yields a [`FrameRate`] once per interval.
#[derive(Debug, Clone)]
pub struct StatsWindow {
    interval: Duration,
    window_start: Option<Instant>,
    frames: u32,
    elapsed: f32,
}

impl StatsWindow {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: None,
            frames: 0,
            elapsed: 0.0,
        }
    }

    /// Drops the partial window. The next pushed frame opens a new one.
    pub fn reset(&mut self) {
        self.window_start = None;
        self.frames = 0;
        self.elapsed = 0.0;
    }

    /// Records one frame. Returns the averages when the interval has elapsed
    /// and starts a new window.
    ///
    /// The frame that opens a window only marks its start; its duration
    /// belongs to whatever happened before.
    pub fn push(&mut self, time: &FrameTime) -> Option<FrameRate> {
        let Some(start) = self.window_start else {
            self.window_start = Some(time.now);
            return None;
        };

        self.frames += 1;
        self.elapsed += time.raw_dt;

        if time.now.saturating_duration_since(start) < self.interval {
            return None;
        }

        let rate = FrameRate {
            fps: if self.elapsed > 0.0 { self.frames as f32 / self.elapsed } else { 0.0 },
            frame_ms: self.elapsed * 1000.0 / self.frames as f32,
            frames: self.frames,
        };

        self.window_start = Some(time.now);
        self.frames = 0;
        self.elapsed = 0.0;

        Some(rate)
    }
}
