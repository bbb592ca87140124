//! Errors produced while preparing the delay core.
//!
//! The audio path itself is infallible: once [`prepare`] has succeeded,
//! every call to `process_block` runs to completion. The only thing that
//! can go wrong is the configuration handed to `prepare`.
//!
//! [`prepare`]: crate::dsp::processor::DelayProcessor::prepare

/// The set of errors the delay core can report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelayError {
    /// `floor(sample_rate * max_delay_seconds)` did not yield at least one
    /// sample of storage. Happens with a zero, negative or non-finite
    /// sample rate or maximum delay time.
    InvalidCapacity {
        /// The sample rate passed to `prepare`, in Hz.
        sample_rate: f32,
        /// The maximum delay time the buffers were sized for, in seconds.
        max_delay_seconds: f32,
    },
}

impl core::fmt::Display for DelayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidCapacity {
                sample_rate,
                max_delay_seconds,
            } => write!(
                f,
                "Cannot allocate a delay line for {max_delay_seconds} s at {sample_rate} Hz: \
                 capacity must be at least one sample"
            ),
        }
    }
}

impl std::error::Error for DelayError {}
