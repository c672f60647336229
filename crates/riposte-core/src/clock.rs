//! Simulation clock with slow-motion support.

use serde::{Deserialize, Serialize};

/// World clock.
///
/// World time only moves while the simulation is ticked. A slow-motion
/// effect scales game time for a duration measured in real time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Elapsed game time in seconds
    now: f64,
    /// Scale applied while slow motion is active
    slow_scale: f32,
    /// Real seconds of slow motion left
    slow_remaining: f32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            now: 0.0,
            slow_scale: 1.0,
            slow_remaining: 0.0,
        }
    }
}

impl SimClock {
    /// Creates a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current world time.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now
    }

    /// Current time scale (1.0 outside slow motion).
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        if self.slow_remaining > 0.0 {
            self.slow_scale
        } else {
            1.0
        }
    }

    /// Checks if slow motion is running.
    #[must_use]
    pub fn is_slowed(&self) -> bool {
        self.slow_remaining > 0.0
    }

    /// Starts (or restarts) slow motion.
    pub fn begin_slow_motion(&mut self, scale: f32, real_duration: f32) {
        self.slow_scale = scale.clamp(f32::EPSILON, 1.0);
        self.slow_remaining = real_duration.max(0.0);
    }

    /// Advances by `real_dt` seconds of real time and returns the game delta.
    pub fn advance(&mut self, real_dt: f32) -> f32 {
        let real_dt = real_dt.max(0.0);
        let game_dt = real_dt * self.time_scale();
        self.now += f64::from(game_dt);

        if self.slow_remaining > 0.0 {
            self.slow_remaining = (self.slow_remaining - real_dt).max(0.0);
        }

        game_dt
    }
}
