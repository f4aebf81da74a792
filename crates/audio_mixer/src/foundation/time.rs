//! Time management utilities

use std::time::{Duration, Instant};

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    frame_start: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            frame_start: now,
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.delta_time = elapsed.as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_start = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Time spent in the current frame so far
    pub fn frame_elapsed(&self) -> Duration {
        self.frame_start.elapsed()
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Internal clock mode of a [`PositionTimer`].
///
/// A paused timer remembers how much time has accumulated; a running timer
/// remembers when it was last resumed and how much it had accumulated
/// before that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerMode {
    Running { resumed_at: Instant, carried: Duration },
    Paused { elapsed: Duration },
}

/// Playback position tracker with explicit pause and resume.
///
/// The music channel uses this to remember where a track should continue
/// from. Paused time does not count toward the elapsed total.
///
/// Every operation has an `_at` variant taking the current instant, so
/// callers that already sampled the clock (and tests) stay deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionTimer {
    mode: TimerMode,
}

impl Default for PositionTimer {
    fn default() -> Self {
        Self::new_paused()
    }
}

impl PositionTimer {
    /// Create a paused timer at zero
    pub fn new_paused() -> Self {
        Self {
            mode: TimerMode::Paused {
                elapsed: Duration::ZERO,
            },
        }
    }

    /// Create a timer that starts running now
    pub fn start_new() -> Self {
        Self::start_new_at(Instant::now())
    }

    /// Create a timer that started running at `now`
    pub fn start_new_at(now: Instant) -> Self {
        Self {
            mode: TimerMode::Running {
                resumed_at: now,
                carried: Duration::ZERO,
            },
        }
    }

    /// Check whether the timer is paused
    pub fn is_paused(&self) -> bool {
        matches!(self.mode, TimerMode::Paused { .. })
    }

    /// Elapsed time since start or the most recent reset, excluding pauses
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    /// Elapsed time as observed at `now`
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.mode {
            TimerMode::Paused { elapsed } => elapsed,
            TimerMode::Running {
                resumed_at,
                carried,
            } => carried + now.saturating_duration_since(resumed_at),
        }
    }

    /// Pause the timer, returning the elapsed time. No effect if already paused.
    pub fn pause(&mut self) -> Duration {
        self.pause_at(Instant::now())
    }

    /// Pause the timer as of `now`
    pub fn pause_at(&mut self, now: Instant) -> Duration {
        let elapsed = self.elapsed_at(now);
        self.mode = TimerMode::Paused { elapsed };
        elapsed
    }

    /// Resume the timer. No effect if already running.
    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    /// Resume the timer as of `now`
    pub fn resume_at(&mut self, now: Instant) {
        if let TimerMode::Paused { elapsed } = self.mode {
            self.mode = TimerMode::Running {
                resumed_at: now,
                carried: elapsed,
            };
        }
    }

    /// Reset the elapsed time to zero, returning the time before the reset.
    /// The paused/running mode is left unchanged.
    pub fn reset(&mut self) -> Duration {
        self.reset_at(Instant::now())
    }

    /// Reset the timer as of `now`
    pub fn reset_at(&mut self, now: Instant) -> Duration {
        let before = self.elapsed_at(now);
        self.mode = match self.mode {
            TimerMode::Paused { .. } => TimerMode::Paused {
                elapsed: Duration::ZERO,
            },
            TimerMode::Running { .. } => TimerMode::Running {
                resumed_at: now,
                carried: Duration::ZERO,
            },
        };
        before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_new_paused_is_zero() {
        let timer = PositionTimer::new_paused();
        assert!(timer.is_paused());
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_running_accumulates() {
        let t0 = Instant::now();
        let timer = PositionTimer::start_new_at(t0);
        assert!(!timer.is_paused());
        assert_eq!(timer.elapsed_at(t0 + ms(250)), ms(250));
    }

    #[test]
    fn test_pause_excludes_paused_time() {
        let t0 = Instant::now();
        let mut timer = PositionTimer::start_new_at(t0);

        assert_eq!(timer.pause_at(t0 + ms(100)), ms(100));
        // Time passes while paused
        assert_eq!(timer.elapsed_at(t0 + ms(500)), ms(100));

        timer.resume_at(t0 + ms(500));
        assert_eq!(timer.elapsed_at(t0 + ms(600)), ms(200));
    }

    #[test]
    fn test_pause_and_resume_are_idempotent() {
        let t0 = Instant::now();
        let mut timer = PositionTimer::start_new_at(t0);

        timer.resume_at(t0 + ms(50));
        assert_eq!(timer.elapsed_at(t0 + ms(100)), ms(100));

        timer.pause_at(t0 + ms(100));
        timer.pause_at(t0 + ms(300));
        assert_eq!(timer.elapsed_at(t0 + ms(400)), ms(100));
    }

    #[test]
    fn test_reset_keeps_mode() {
        let t0 = Instant::now();
        let mut paused = PositionTimer::start_new_at(t0);
        paused.pause_at(t0 + ms(80));
        assert_eq!(paused.reset_at(t0 + ms(90)), ms(80));
        assert!(paused.is_paused());
        assert_eq!(paused.elapsed_at(t0 + ms(200)), Duration::ZERO);

        let mut running = PositionTimer::start_new_at(t0);
        assert_eq!(running.reset_at(t0 + ms(40)), ms(40));
        assert!(!running.is_paused());
        assert_eq!(running.elapsed_at(t0 + ms(60)), ms(20));
    }

    #[test]
    fn test_timer_frame_count() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.delta_time() >= 0.0);
    }
}
