//! # Read Head and Linear Interpolation
//!
//! The read head trails the write head by the current delay time. Because
//! the delay time is smoothed continuously, the distance is almost never a
//! whole number of samples (e.g. 22050.37 samples), so we read the two
//! stored samples that straddle the position and blend between them.
//!
//! ## Position Math
//!
//! ```text
//! delay_samples = delay_seconds * sample_rate
//! read_head     = write_head - delay_samples      (+ capacity if negative)
//! i0            = floor(read_head)
//! i1            = i0 + 1                          (0 if it hits capacity)
//! frac          = read_head - i0                  in [0, 1)
//! ```
//!
//! The delay never exceeds the buffer capacity, so a single wrap is enough
//! to bring the position back into `[0, capacity)`.
//!
//! ## Linear Interpolation
//!
//! ```text
//! result = (1 - frac) * s0 + frac * s1
//! ```
//!
//! It is cheap and good enough for a modulated delay, at the cost of a
//! slight high-frequency roll-off on fractional positions. Higher-order
//! interpolation would change the sound of the effect, so it stays linear.

/// Convert a delay time in seconds into a (fractional) number of samples.
///
/// At 48000 Hz, 0.5 s is 24000 samples and 2.0 s is 96000 samples.
#[inline]
pub fn delay_in_samples(delay_seconds: f32, sample_rate: f32) -> f32 {
    delay_seconds * sample_rate
}

/// Blend two adjacent samples by `frac`.
///
/// `frac = 0.0` gives exactly `s0`, `frac = 1.0` gives exactly `s1`.
#[inline]
pub fn interpolate(s0: f32, s1: f32, frac: f32) -> f32 {
    (1.0 - frac) * s0 + frac * s1
}

/// The two buffer slots and blend factor for one fractional read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadHead {
    /// The slot at or just before the read position.
    pub i0: usize,
    /// The slot after `i0`, wrapped to 0 at the end of the buffer.
    pub i1: usize,
    /// Distance from `i0` toward `i1`, in `[0, 1)`.
    pub frac: f32,
}

impl ReadHead {
    /// Work out where to read for a write head position and a delay in
    /// samples, on a buffer of `capacity` samples.
    ///
    /// Both indices are always valid buffer positions. A delay beyond the
    /// capacity (possible only through float rounding when
    /// `sample_rate * max_delay` is not an integer) is pinned to the
    /// capacity.
    pub fn resolve(write_head: usize, delay_samples: f32, capacity: usize) -> Self {
        debug_assert!(capacity > 0, "resolving a read head on an empty buffer");
        debug_assert!(write_head < capacity);

        let len = capacity as f32;
        let delay = delay_samples.clamp(0.0, len);

        let mut position = write_head as f32 - delay;
        if position < 0.0 {
            position += len;
        }
        // `-tiny + len` can round up to exactly `len`.
        if position >= len {
            position -= len;
        }

        let i0 = position as usize;
        let frac = position - i0 as f32;

        let mut i1 = i0 + 1;
        if i1 == capacity {
            i1 = 0;
        }

        debug_assert!(i0 < capacity && i1 < capacity, "read index out of bounds");
        debug_assert!((0.0..1.0).contains(&frac), "fraction {frac} outside [0, 1)");

        Self { i0, i1, frac }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
