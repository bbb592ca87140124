//! # Delay Processor
//!
//! Ties the ring buffers, read head and smoother together into the
//! per-sample loop the plugin runs on every audio block:
//!
//! ```text
//! Input ──┬─────────────────────────────────────────── × (1 - wet) ──┐
//!         │                                                          │
//!         └──►(+)──► [Stereo Delay Line] ──► read @ smoothed delay   │
//!              ▲                                   │                 │
//!              │                                   ├── × wet ──────►(+)──► Output
//!              └──── × feedback (next sample) ◄────┘
//! ```
//!
//! All running state lives in [`DelayProcessor`] and is only touched from
//! the audio thread. Nothing in [`process_block`](DelayProcessor::process_block)
//! allocates, locks or fails.

use super::{
    delay_line::StereoDelayLine,
    read_head::{delay_in_samples, interpolate, ReadHead},
    smoother::OnePoleSmoother,
};
use crate::{error::DelayError, params::DelayControls};

/// Longest supported delay time, in seconds. The buffers are sized for it.
pub const MAX_DELAY_TIME: f32 = 2.0;

/// The stereo delay core.
///
/// Lifecycle:
///
/// 1. [`prepare`](Self::prepare) once the sample rate is known. This is the
///    only call that allocates.
/// 2. [`process_block`](Self::process_block) for every audio block.
/// 3. Optionally [`reset`](Self::reset) on transport stop, and
///    [`release`](Self::release) when the host deactivates the plugin.
#[derive(Debug)]
pub struct DelayProcessor {
    sample_rate: f32,

    /// The delay time the buffers are sized for, in seconds.
    max_delay_seconds: f32,

    delay_line: StereoDelayLine,

    /// Delay time in seconds, trailing the raw parameter.
    smoothed_delay: OnePoleSmoother,

    /// Delayed output times feedback gain from the previous sample. Summed
    /// with the input on the *next* write.
    feedback_left: f32,
    feedback_right: f32,
}

impl Default for DelayProcessor {
    fn default() -> Self {
        Self::with_max_delay(MAX_DELAY_TIME)
    }
}

impl DelayProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A processor whose buffers hold `max_delay_seconds` of audio instead
    /// of [`MAX_DELAY_TIME`]. Delay times handed to it must not exceed that.
    pub fn with_max_delay(max_delay_seconds: f32) -> Self {
        Self {
            // Placeholder until `prepare` hears the real rate.
            sample_rate: 44100.0,
            max_delay_seconds,
            delay_line: StereoDelayLine::new(),
            smoothed_delay: OnePoleSmoother::default(),
            feedback_left: 0.0,
            feedback_right: 0.0,
        }
    }

    /// Size the buffers for the current sample rate and clear all running
    /// state.
    ///
    /// The write head goes back to 0, both feedback values to silence, and
    /// the smoothed delay time snaps to the current raw parameter value so
    /// playback starts without a glide.
    ///
    /// `_block_size_hint` is the largest block the host promises to send;
    /// the per-sample loop does not need it.
    ///
    /// Fails with [`DelayError::InvalidCapacity`] if the sample rate and
    /// maximum delay do not give at least one sample of storage. In that
    /// case the previous session (if any) is left as it was.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        _block_size_hint: usize,
        controls: &impl DelayControls,
    ) -> Result<(), DelayError> {
        self.delay_line.prepare(sample_rate, self.max_delay_seconds)?;
        self.sample_rate = sample_rate;
        self.reset_state(controls);
        Ok(())
    }

    /// Silence the buffers and reset the running state without
    /// reallocating. Safe to call from the audio thread.
    pub fn reset(&mut self, controls: &impl DelayControls) {
        self.delay_line.clear();
        self.reset_state(controls);
    }

    /// Free the buffers. Until the next `prepare`, `process_block` leaves
    /// audio untouched.
    pub fn release(&mut self) {
        self.delay_line.release();
    }

    fn reset_state(&mut self, controls: &impl DelayControls) {
        self.smoothed_delay.reset(controls.delay_time());
        self.feedback_left = 0.0;
        self.feedback_right = 0.0;
    }

    pub fn is_prepared(&self) -> bool {
        self.delay_line.is_prepared()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples per channel; 0 when unprepared.
    pub fn capacity(&self) -> usize {
        self.delay_line.capacity()
    }

    pub fn write_head(&self) -> usize {
        self.delay_line.write_head()
    }

    pub fn smoothed_delay_time(&self) -> f32 {
        self.smoothed_delay.current()
    }

    /// The `(left, right)` values that will be added to the next input.
    pub fn feedback_state(&self) -> (f32, f32) {
        (self.feedback_left, self.feedback_right)
    }

    /// Run the delay over one block in place.
    ///
    /// Processes `min(left.len(), right.len())` samples; each sample is read
    /// and overwritten exactly once. Does nothing if the processor is not
    /// prepared.
    pub fn process_block(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        controls: &impl DelayControls,
    ) {
        if !self.is_prepared() {
            return;
        }

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process_sample(*l, *r, controls);
        }
    }

    /// Advance the delay by one stereo sample and return the mixed output.
    ///
    /// The processor must be prepared.
    pub fn process_sample(
        &mut self,
        input_left: f32,
        input_right: f32,
        controls: &impl DelayControls,
    ) -> (f32, f32) {
        // ─── Glide the delay time toward the knob ───
        let delay_seconds = self.smoothed_delay.next(controls.delay_time());
        let delay_samples = delay_in_samples(delay_seconds, self.sample_rate);

        // ─── Read before write ───
        //
        // The slot under the write head is about to be overwritten, so the
        // delayed sample must be fetched first.
        let head = ReadHead::resolve(
            self.delay_line.write_head(),
            delay_samples,
            self.delay_line.capacity(),
        );
        let (left0, right0) = self.delay_line.read_at(head.i0);
        let (left1, right1) = self.delay_line.read_at(head.i1);
        let delayed_left = interpolate(left0, left1, head.frac);
        let delayed_right = interpolate(right0, right1, head.frac);

        // ─── Write input plus the previous sample's feedback ───
        self.delay_line.write(
            input_left + self.feedback_left,
            input_right + self.feedback_right,
        );

        // Picked up by the next sample's write, not this one.
        let feedback = controls.feedback();
        self.feedback_left = delayed_left * feedback;
        self.feedback_right = delayed_right * feedback;

        // ─── Mix ───
        let wet = controls.dry_wet();
        let dry = 1.0 - wet;
        (
            input_left * dry + delayed_left * wet,
            input_right * dry + delayed_right * wet,
        )
    }

    /// How many samples the echoes keep ringing after the input stops.
    ///
    /// Each trip around the loop scales the signal by `feedback`, so after
    /// `N` repeats the level is `feedback^N`. Solving for -60 dB:
    ///
    /// ```text
    /// N = log10(0.001) / log10(feedback) = -3 / log10(feedback)
    /// ```
    ///
    /// The tail is `N` delay periods, or one period when there is
    /// effectively no feedback.
    pub fn tail_samples(&self, controls: &impl DelayControls) -> u32 {
        let delay_samples = delay_in_samples(self.smoothed_delay.current(), self.sample_rate);
        let feedback = controls.feedback();

        if feedback > 0.001 {
            let repeats = -3.0 / feedback.log10();
            (repeats * delay_samples) as u32
        } else {
            delay_samples as u32
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DelaySettings;

    fn settings(delay_time: f32, feedback: f32, dry_wet: f32) -> DelaySettings {
        DelaySettings {
            dry_wet,
            feedback,
            delay_time,
        }
    }

    fn prepared(sample_rate: f32, controls: &DelaySettings) -> DelayProcessor {
        let mut processor = DelayProcessor::new();
        processor.prepare(sample_rate, 512, controls).unwrap();
        processor
    }

    /// Run `len` samples of a left-channel unit impulse through the
    /// processor in blocks of 512 and return the left output.
    fn impulse_response(
        processor: &mut DelayProcessor,
        controls: &DelaySettings,
        len: usize,
    ) -> Vec<f32> {
        let mut left = vec![0.0; len];
        let mut right = vec![0.0; len];
        left[0] = 1.0;

        for (l, r) in left.chunks_mut(512).zip(right.chunks_mut(512)) {
            processor.process_block(l, r, controls);
        }

        assert!(
            right.iter().all(|s| s.abs() < 1e-9),
            "silent right input should stay silent"
        );
        left
    }

    /// Index and value of the loudest sample in `signal[range]`.
    fn peak(signal: &[f32], range: std::ops::Range<usize>) -> (usize, f32) {
        signal[range.clone()]
            .iter()
            .enumerate()
            .map(|(i, s)| (range.start + i, s.abs()))
            .fold((range.start, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    /// 48 kHz, 2 s maximum: 96000 samples per channel.
    #[test]
    fn test_prepare_sizes_buffers() {
        let processor = prepared(48000.0, &DelaySettings::default());

        assert!(processor.is_prepared());
        assert_eq!(processor.capacity(), 96000);
        assert_eq!(processor.write_head(), 0);
        assert_eq!(processor.smoothed_delay_time(), 0.5);
        assert_eq!(processor.feedback_state(), (0.0, 0.0));
    }

    #[test]
    fn test_prepare_rejects_bad_sample_rate() {
        let mut processor = DelayProcessor::new();
        let result = processor.prepare(0.0, 512, &DelaySettings::default());

        assert_eq!(
            result,
            Err(DelayError::InvalidCapacity {
                sample_rate: 0.0,
                max_delay_seconds: MAX_DELAY_TIME,
            })
        );
        assert!(!processor.is_prepared());
    }

    /// Without a successful prepare, audio passes through unchanged.
    #[test]
    fn test_unprepared_block_is_untouched() {
        let mut processor = DelayProcessor::new();
        let mut left: [f32; 3] = [0.1, 0.2, 0.3];
        let mut right: [f32; 3] = [-0.1, -0.2, -0.3];

        processor.process_block(&mut left, &mut right, &DelaySettings::default());

        assert_eq!(left, [0.1, 0.2, 0.3]);
        assert_eq!(right, [-0.1, -0.2, -0.3]);
    }

    #[test]
    fn test_release_returns_to_passthrough() {
        let controls = settings(0.5, 0.5, 1.0);
        let mut processor = prepared(1000.0, &controls);
        processor.release();

        let mut left: [f32; 2] = [1.0, 0.5];
        let mut right: [f32; 2] = [0.25, 0.0];
        processor.process_block(&mut left, &mut right, &controls);

        assert!(!processor.is_prepared());
        assert_eq!(left, [1.0, 0.5]);
        assert_eq!(right, [0.25, 0.0]);
    }

    /// One impulse at 0.5 s / 48 kHz comes out 24000 samples later, and
    /// nothing before that.
    #[test]
    fn test_impulse_at_half_second() {
        let controls = settings(0.5, 0.0, 1.0);
        let mut processor = prepared(48000.0, &controls);

        let out = impulse_response(&mut processor, &controls, 30000);

        assert!((out[24000] - 1.0).abs() < 1e-3, "expected echo, got {}", out[24000]);
        for (i, s) in out.iter().enumerate().filter(|(i, _)| *i != 24000) {
            assert!(s.abs() < 1e-3, "unexpected output {s} at sample {i}");
        }
    }

    /// Each channel is delayed independently.
    #[test]
    fn test_channels_are_independent() {
        let controls = settings(0.01, 0.0, 1.0);
        let mut processor = prepared(1000.0, &controls);

        let mut left = vec![0.0; 20];
        let mut right = vec![0.0; 20];
        left[0] = 1.0;
        right[3] = -0.5;
        processor.process_block(&mut left, &mut right, &controls);

        // 0.01 s at 1 kHz = 10 samples.
        assert!((left[10] - 1.0).abs() < 1e-4);
        assert!((right[13] + 0.5).abs() < 1e-4);
        assert!(left[13].abs() < 1e-4);
        assert!(right[10].abs() < 1e-4);
    }

    /// Feedback 0.5 gives a train of echoes, each half the one before.
    ///
    /// The feedback value re-enters the line one sample after the echo is
    /// read, so repeats after the first land one sample later per trip.
    #[test]
    fn test_echo_train_halves() {
        let controls = settings(0.5, 0.5, 1.0);
        let mut processor = prepared(48000.0, &controls);
        let delay = 24000;

        let out = impulse_response(&mut processor, &controls, 4 * delay + 16);

        let mut expected = 1.0;
        let mut prev_index = 0;
        for echo in 1..=4 {
            let center = echo * delay + (echo - 1);
            let (index, level) = peak(&out, center - 4..center + 5);

            assert!(
                (level - expected).abs() < 1e-3,
                "echo {echo}: expected {expected}, got {level} at {index}"
            );
            if echo > 1 {
                let spacing = index - prev_index;
                assert!(
                    (delay..=delay + 1).contains(&spacing),
                    "echo {echo} spacing {spacing}"
                );
            }

            prev_index = index;
            expected *= 0.5;
        }

        // Silence between echoes.
        let (_, gap) = peak(&out, delay + 10..2 * delay - 10);
        assert!(gap < 1e-3, "leak between echoes: {gap}");
    }

    /// With feedback below unity an impulse always dies away.
    #[test]
    fn test_feedback_is_stable() {
        let sample_rate = 1000.0;
        let len = 20_000;

        for feedback in [0.0, 0.25, 0.5, 0.9, 0.97] {
            let controls = settings(0.05, feedback, 1.0);
            let mut processor = prepared(sample_rate, &controls);

            let out = impulse_response(&mut processor, &controls, len);

            let (_, max) = peak(&out, 0..len);
            assert!(max <= 1.0 + 1e-4, "feedback {feedback}: output grew to {max}");

            let (_, early) = peak(&out, 0..1000);
            let (_, late) = peak(&out, len - 1000..len);
            assert!(late < early, "feedback {feedback}: no decay ({early} -> {late})");
            assert!(late < 1e-3, "feedback {feedback}: tail still at {late}");
        }
    }

    /// Minimum dry/wet is almost all dry, full dry/wet is all delay.
    #[test]
    fn test_dry_wet_boundaries() {
        let sample_rate = 1000.0;
        let input: Vec<f32> = (0..400)
            .map(|i| (i as f32 * 0.05).sin())
            .collect();

        // Mostly dry.
        let controls = settings(0.1, 0.0, 0.01);
        let mut processor = prepared(sample_rate, &controls);
        let mut left = input.clone();
        let mut right = input.clone();
        processor.process_block(&mut left, &mut right, &controls);
        for (out, dry) in left.iter().zip(&input) {
            assert!((out - dry).abs() <= 0.02 + 1e-6, "dry/wet 0.01 strayed: {out} vs {dry}");
        }

        // Fully wet: output is the input shifted by 100 samples.
        let controls = settings(0.1, 0.0, 1.0);
        let mut processor = prepared(sample_rate, &controls);
        let mut left = input.clone();
        let mut right = input.clone();
        processor.process_block(&mut left, &mut right, &controls);
        for i in 0..100 {
            assert!(left[i].abs() < 1e-6, "wet output before the delay at {i}");
        }
        for i in 100..input.len() {
            assert!(
                (left[i] - input[i - 100]).abs() < 1e-4,
                "sample {i}: {} vs {}",
                left[i],
                input[i - 100]
            );
            assert!((right[i] - input[i - 100]).abs() < 1e-4);
        }
    }

    /// Turning the delay knob glides the smoothed time to the new value.
    #[test]
    fn test_delay_time_glides_to_target() {
        let mut controls = settings(0.5, 0.0, 0.5);
        let mut processor = prepared(1000.0, &controls);

        controls.delay_time = 1.5;
        let mut left = vec![0.0; 20_000];
        let mut right = vec![0.0; 20_000];

        processor.process_block(&mut left[..1], &mut right[..1], &controls);
        let first = processor.smoothed_delay_time();
        assert!(first > 0.5 && first < 0.51, "first step jumped to {first}");

        processor.process_block(&mut left[1..], &mut right[1..], &controls);
        let settled = processor.smoothed_delay_time();
        assert!((settled - 1.5).abs() < 1e-3, "expected ~1.5, got {settled}");
    }

    /// A step in delay time never causes a jump in the output of a smooth
    /// signal.
    #[test]
    fn test_delay_change_is_click_free() {
        let sample_rate = 1000.0;
        let mut controls = settings(0.2, 0.0, 1.0);
        let mut processor = prepared(sample_rate, &controls);

        let mut left: Vec<f32> = (0..4000).map(|i| (i as f32 * 0.01).sin()).collect();
        let mut right = left.clone();

        processor.process_block(&mut left[..1000], &mut right[..1000], &controls);
        controls.delay_time = 1.0;
        processor.process_block(&mut left[1000..], &mut right[1000..], &controls);

        // 0.01 rad/sample sine: neighbours differ by at most ~0.01 in the
        // input; the glide bends pitch a little but never jumps.
        let max_step = left[500..]
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0_f32, f32::max);
        assert!(max_step < 0.05, "discontinuity of {max_step} in output");
    }

    /// Preparing again at a new rate resizes and resets everything.
    #[test]
    fn test_reprepare_resets_state() {
        let mut controls = settings(0.5, 0.5, 1.0);
        let mut processor = prepared(48000.0, &controls);

        let mut left = vec![0.3; 30_000];
        let mut right = left.clone();
        processor.process_block(&mut left, &mut right, &controls);
        assert_eq!(processor.write_head(), 30_000);
        assert_ne!(processor.feedback_state(), (0.0, 0.0));

        controls.delay_time = 0.8;
        processor.prepare(44100.0, 512, &controls).unwrap();

        assert_eq!(processor.sample_rate(), 44100.0);
        assert_eq!(processor.capacity(), 88200);
        assert_eq!(processor.write_head(), 0);
        assert_eq!(processor.smoothed_delay_time(), 0.8);
        assert_eq!(processor.feedback_state(), (0.0, 0.0));

        // The old echoes are gone.
        let mut left = vec![0.0; 44100];
        let mut right = vec![0.0; 44100];
        processor.process_block(&mut left, &mut right, &controls);
        assert!(left.iter().all(|s| s.abs() < 1e-9));
    }

    /// `reset` wipes the echoes but keeps the allocation.
    #[test]
    fn test_reset_clears_echoes() {
        let controls = settings(0.01, 0.9, 1.0);
        let mut processor = prepared(1000.0, &controls);
        // Stop right after the second echo so feedback is still pending.
        impulse_response(&mut processor, &controls, 22);
        assert_ne!(processor.feedback_state(), (0.0, 0.0));

        processor.reset(&controls);

        assert_eq!(processor.capacity(), 2000);
        assert_eq!(processor.write_head(), 0);
        assert_eq!(processor.feedback_state(), (0.0, 0.0));

        let mut left = [0.0_f32; 100];
        let mut right = [0.0_f32; 100];
        processor.process_block(&mut left, &mut right, &controls);
        assert!(left.iter().all(|s| s.abs() < 1e-9));
    }

    /// The longest delay reads the oldest sample, never fresh memory.
    #[test]
    fn test_max_delay_reads_oldest_sample() {
        let controls = settings(MAX_DELAY_TIME, 0.0, 1.0);
        let mut processor = prepared(100.0, &controls);
        assert_eq!(processor.capacity(), 200);

        let out = impulse_response(&mut processor, &controls, 260);

        assert!((out[200] - 1.0).abs() < 1e-4, "expected echo at 200, got {}", out[200]);
        for (i, s) in out.iter().enumerate().filter(|(i, _)| *i != 200) {
            assert!(s.abs() < 1e-4, "unexpected {s} at {i}");
        }
    }

    #[test]
    fn test_custom_max_delay() {
        let controls = settings(0.25, 0.0, 1.0);
        let mut processor = DelayProcessor::with_max_delay(0.5);
        processor.prepare(48000.0, 256, &controls).unwrap();

        assert_eq!(processor.capacity(), 24000);
    }

    #[test]
    fn test_tail_length() {
        let controls = settings(0.5, 0.0, 1.0);
        let processor = prepared(1000.0, &controls);
        assert_eq!(processor.tail_samples(&controls), 500);

        // 0.1 feedback: -60 dB after 3 repeats.
        let controls = settings(0.5, 0.1, 1.0);
        let processor = prepared(1000.0, &controls);
        let tail = processor.tail_samples(&controls);
        assert!((1499..=1500).contains(&tail), "got {tail}");
    }
}
