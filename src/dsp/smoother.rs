//! # One-Pole Parameter Smoother
//!
//! The read head position is derived directly from the delay time, so a
//! jump in delay time is a jump in read position: the output would skip to
//! a different point in the buffer and click. Running the delay time
//! through a one-pole lowpass turns that jump into a glide, which is heard
//! as a short pitch bend instead of a glitch.
//!
//! ## The Equation
//!
//! ```text
//! y[n] = y[n-1] + c * (target - y[n-1])
//! ```
//!
//! Each sample closes a fixed fraction `c` of the remaining distance to the
//! target. With `c = 0.001` the remaining error after `n` samples is
//! `(1 - c)^n`, so about 6900 samples (~0.14 s at 48 kHz) bring it below
//! 0.1% of the original step.

/// Fraction of the remaining distance covered per sample.
pub const SMOOTHING_COEFFICIENT: f32 = 0.001;

/// Exponential (one-pole) smoother for the delay time, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnePoleSmoother {
    /// The smoothed value, lagging behind whatever target is fed in.
    current: f32,
}

impl OnePoleSmoother {
    /// Start out already settled on `value`.
    pub fn new(value: f32) -> Self {
        Self { current: value }
    }

    /// Jump straight to `value` with no glide. Used when (re)preparing so a
    /// fresh session does not sweep in from a stale delay time.
    pub fn reset(&mut self, value: f32) {
        self.current = value;
    }

    /// Move one sample toward `target` and return the new smoothed value.
    #[inline]
    pub fn next(&mut self, target: f32) -> f32 {
        self.current += SMOOTHING_COEFFICIENT * (target - self.current);
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }
}

impl Default for OnePoleSmoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
