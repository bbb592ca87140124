//! # Stereo Delay Line (Ring Buffer Pair)
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified time delay. This crate keeps one ring buffer per channel and
//! drives both from a single shared write head, so the left and right
//! echoes always stay sample-aligned.
//!
//! ## How a Ring Buffer Works
//!
//! Imagine a circular tape loop. A "write head" records incoming audio
//! onto the tape, and a "read head" plays it back from a position further
//! behind on the tape. The distance between the two heads determines the
//! delay time.
//!
//! In code, each channel is a `Vec<f32>` and the write head is an integer
//! index. For every audio sample:
//!
//! 1. Read whatever sits behind the write head (see
//!    [`read_head`](super::read_head) for the position math).
//! 2. [`write`](StereoDelayLine::write) the new left/right pair at the
//!    write head, which also moves the head forward by one, wrapping back
//!    to 0 at the end of the buffer.
//!
//! Reading always happens *before* writing, so a read never sees the value
//! that is about to be overwritten in the same sample.
//!
//! ## Sizing
//!
//! The buffers hold exactly `floor(sample_rate * max_delay_seconds)`
//! samples. That is the longest delay the read head can ever ask for, so
//! the capacity is fixed for a prepared session and only changes when the
//! sample rate (or maximum delay) does.

use std::num::NonZeroUsize;

use crate::error::DelayError;

/// Compute the per-channel capacity for a sample rate and maximum delay.
///
/// Returns [`DelayError::InvalidCapacity`] when the product does not give
/// at least one whole sample, which covers zero, negative, NaN and infinite
/// inputs alike.
///
/// ```text
/// 48000 Hz * 2.0 s = 96000 samples
/// 44100 Hz * 2.0 s = 88200 samples
/// ```
pub fn capacity_for(sample_rate: f32, max_delay_seconds: f32) -> Result<NonZeroUsize, DelayError> {
    let invalid = DelayError::InvalidCapacity {
        sample_rate,
        max_delay_seconds,
    };

    // Multiply in f64 so common rates land on exact integers.
    let samples = (f64::from(sample_rate) * f64::from(max_delay_seconds)).floor();
    if !samples.is_finite() || samples < 1.0 {
        return Err(invalid);
    }

    NonZeroUsize::new(samples as usize).ok_or(invalid)
}

/// Two equally sized ring buffers (left/right) sharing one write head.
///
/// A freshly constructed line has no storage. [`prepare`](Self::prepare)
/// must succeed before any sample is written; the processor checks
/// [`is_prepared`](Self::is_prepared) before touching the buffers.
#[derive(Debug, Default)]
pub struct StereoDelayLine {
    left: Vec<f32>,
    right: Vec<f32>,

    /// Where the next incoming pair will be stored. Advances by 1 each
    /// sample, wrapping to 0 at `capacity()`.
    write_head: usize,
}

impl StereoDelayLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size both buffers for `max_delay_seconds` at `sample_rate`, fill them
    /// with silence and move the write head back to 0.
    ///
    /// This is the only place memory is allocated. When the computed
    /// capacity matches the current one, the existing buffers are reused and
    /// simply zeroed.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        max_delay_seconds: f32,
    ) -> Result<NonZeroUsize, DelayError> {
        let capacity = capacity_for(sample_rate, max_delay_seconds)?;

        if capacity.get() == self.capacity() {
            self.clear();
        } else {
            self.left = vec![0.0; capacity.get()];
            self.right = vec![0.0; capacity.get()];
            self.write_head = 0;
        }

        Ok(capacity)
    }

    /// Drop both buffers. The line reports a capacity of 0 until the next
    /// successful [`prepare`](Self::prepare).
    pub fn release(&mut self) {
        self.left = Vec::new();
        self.right = Vec::new();
        self.write_head = 0;
    }

    /// Number of samples each channel can hold.
    pub fn capacity(&self) -> usize {
        self.left.len()
    }

    pub fn is_prepared(&self) -> bool {
        self.capacity() > 0
    }

    pub fn write_head(&self) -> usize {
        self.write_head
    }

    /// Store one sample per channel at the write head, then advance the
    /// head by one, wrapping at the end of the buffer.
    ///
    /// Call this exactly once per sample, after the delayed output for that
    /// sample has been read.
    pub fn write(&mut self, left: f32, right: f32) {
        self.left[self.write_head] = left;
        self.right[self.write_head] = right;

        self.write_head += 1;
        if self.write_head >= self.left.len() {
            self.write_head = 0;
        }
    }

    /// The raw `(left, right)` pair stored at `index`.
    ///
    /// `index` must lie in `[0, capacity())`.
    pub fn read_at(&self, index: usize) -> (f32, f32) {
        debug_assert!(
            index < self.capacity(),
            "read index {index} outside delay line of {} samples",
            self.capacity()
        );

        (self.left[index], self.right[index])
    }

    /// Fill both buffers with silence and reset the write head, keeping the
    /// current allocation.
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
        self.write_head = 0;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
