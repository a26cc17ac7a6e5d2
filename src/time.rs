//! Frame clock feeding the stepper.
//!
//! Supplies the seconds elapsed since the previous frame, measured with
//! `std::time::Instant`, so it is monotonic and never negative.
//!
//! # Example
//!
//! ```ignore
//! use constellation::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // Once per redraw:
//! let delta = clock.tick();
//! engine.frame(delta, &mut renderer)?;
//! ```

use std::time::{Duration, Instant};

/// Per-frame delta time source.
#[derive(Debug)]
pub struct FrameClock {
    /// When the last frame occurred.
    last_frame: Instant,
    /// Time since last frame in seconds.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update FPS calculation.
    fps_update_interval: Duration,
    paused: bool,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
}

impl FrameClock {
    /// Create a clock whose first tick measures from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Advance to a new frame and return its delta in seconds.
    ///
    /// While paused the delta is zero, which makes the next engine step a no-op.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if self.paused {
            self.delta_secs = 0.0;
            return 0.0;
        }

        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta) * self.time_scale;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    /// Delta of the most recent tick.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames ticked while running.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Toggle pause state. Time spent paused is never reported as delta.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Use a fixed delta instead of wall-clock time. `None` restores real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(|d| d.max(0.0));
    }

    /// Set time scale multiplier. Negative values clamp to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert!(!clock.is_paused());
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_tick_measures_time() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let delta = clock.tick();

        assert!(delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_paused_delta_is_zero() {
        let mut clock = FrameClock::new();
        clock.tick();

        clock.toggle_pause();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.frame(), 1);

        // The paused interval is not reported after resuming
        clock.toggle_pause();
        clock.set_fixed_delta(Some(0.25));
        assert_eq!(clock.tick(), 0.25);
    }

    #[test]
    fn test_time_scale() {
        let mut clock = FrameClock::new();
        clock.set_time_scale(2.0);
        clock.set_fixed_delta(Some(0.1));
        assert!((clock.tick() - 0.2).abs() < 1e-6);

        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = FrameClock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));

        thread::sleep(Duration::from_millis(100));
        clock.tick();

        let expected = 1.0 / 60.0;
        assert!((clock.delta() - expected).abs() < 0.0001);
    }
}
