//! Linear volume ramps for fade-in and fade-out
//!
//! Ramps are advanced by explicit time steps rather than sampling the
//! clock, so both the device backend (wall time) and the headless backend
//! (virtual time) drive them the same way.

use std::time::Duration;

/// Direction of a ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// Gain rises from 0 to 1
    In,
    /// Gain falls from its starting level to 0
    Out,
}

/// A linear gain ramp over a fixed duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeRamp {
    direction: FadeDirection,
    duration: Duration,
    elapsed: Duration,
    /// Gain at the start of a fade-out
    start: f32,
}

impl FadeRamp {
    /// Ramp from silence to full gain
    pub fn fade_in(duration: Duration) -> Self {
        Self::new(FadeDirection::In, duration)
    }

    /// Ramp from full gain to silence
    pub fn fade_out(duration: Duration) -> Self {
        Self::fade_out_from(1.0, duration)
    }

    /// Ramp from `start_gain` to silence
    ///
    /// Used when a fade-out interrupts a ramp that has not reached full gain.
    pub fn fade_out_from(start_gain: f32, duration: Duration) -> Self {
        Self {
            start: start_gain.clamp(0.0, 1.0),
            ..Self::new(FadeDirection::Out, duration)
        }
    }

    fn new(direction: FadeDirection, duration: Duration) -> Self {
        Self {
            direction,
            duration,
            elapsed: Duration::ZERO,
            start: 1.0,
        }
    }

    /// Ramp direction
    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    /// Total ramp length
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time left until the ramp completes
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }

    /// Move the ramp forward by `dt`, returning the new gain
    pub fn advance(&mut self, dt: Duration) -> f32 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.gain()
    }

    /// Fraction of the ramp completed, in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Current gain multiplier, in `[0, 1]`
    pub fn gain(&self) -> f32 {
        match self.direction {
            FadeDirection::In => self.progress(),
            FadeDirection::Out => self.start * (1.0 - self.progress()),
        }
    }

    /// Check whether the ramp has reached its end
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fade_in_ramps_up() {
        let mut ramp = FadeRamp::fade_in(Duration::from_millis(400));
        assert_relative_eq!(ramp.gain(), 0.0);
        assert_relative_eq!(ramp.advance(Duration::from_millis(100)), 0.25);
        assert_relative_eq!(ramp.advance(Duration::from_millis(300)), 1.0);
        assert!(ramp.is_complete());
    }

    #[test]
    fn test_fade_out_ramps_down() {
        let mut ramp = FadeRamp::fade_out(Duration::from_secs(1));
        assert_relative_eq!(ramp.gain(), 1.0);
        assert_relative_eq!(ramp.advance(Duration::from_millis(500)), 0.5);
        assert_eq!(ramp.remaining(), Duration::from_millis(500));
        assert!(!ramp.is_complete());
    }

    #[test]
    fn test_fade_out_from_partial_gain() {
        let mut ramp = FadeRamp::fade_out_from(0.25, Duration::from_millis(200));
        assert_relative_eq!(ramp.gain(), 0.25);
        assert_relative_eq!(ramp.advance(Duration::from_millis(100)), 0.125);
        assert_relative_eq!(ramp.advance(Duration::from_millis(100)), 0.0);
        assert!(ramp.is_complete());
    }

    #[test]
    fn test_overshoot_is_clamped() {
        let mut ramp = FadeRamp::fade_out(Duration::from_millis(10));
        assert_relative_eq!(ramp.advance(Duration::from_secs(5)), 0.0);
        assert_eq!(ramp.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_zero_length_ramp_is_complete() {
        let ramp = FadeRamp::fade_in(Duration::ZERO);
        assert!(ramp.is_complete());
        assert_relative_eq!(ramp.gain(), 1.0);
    }
}
