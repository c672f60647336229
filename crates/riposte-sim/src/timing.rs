//! Fixed timestep accumulation.
//!
//! Frame deltas of any length are turned into a whole number of fixed
//! simulation steps.

/// Most fixed steps a single frame may run.
const MAX_UPDATES: u32 = 10;

/// Fixed timestep accumulator.
#[derive(Debug, Clone)]
pub struct FixedStep {
    /// Fixed step length
    fixed_dt: f32,
    /// Time not yet consumed by a step
    accumulator: f32,
    /// Longest frame delta accepted
    max_dt: f32,
}

impl FixedStep {
    /// Create an accumulator for steps of `fixed_dt` seconds.
    #[must_use]
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            fixed_dt: fixed_dt.max(0.001),
            accumulator: 0.0,
            max_dt: 0.25,
        }
    }

    /// Get the fixed timestep value.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Accumulate a frame delta.
    /// Returns the number of fixed steps that should run.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        // Clamp to prevent spiral of death
        self.accumulator += dt.clamp(0.0, self.max_dt);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_UPDATES {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind: drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        count
    }

    /// Fraction of a step left in the accumulator.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.fixed_dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_accumulation() {
        let mut timing = FixedStep::new(0.25);
        assert_eq!(timing.accumulate(0.125), 0);
        assert_eq!(timing.accumulate(0.125), 1);
        assert_eq!(timing.accumulate(0.25), 1);
        assert_eq!(timing.alpha(), 0.0);
    }

    #[test]
    fn test_long_frames_are_clamped() {
        let mut timing = FixedStep::new(1.0 / 64.0);
        // 0.25 cap = 16 steps, capped again at MAX_UPDATES
        assert_eq!(timing.accumulate(10.0), MAX_UPDATES);
        assert_eq!(timing.alpha(), 0.0);
    }

    #[test]
    fn test_minimum_step() {
        assert_eq!(FixedStep::new(0.0).fixed_dt(), 0.001);
    }
}
