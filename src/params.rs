//! # Plugin Parameters
//!
//! Three knobs drive the delay: dry/wet mix, feedback and delay time. Each
//! one has a unique string ID (`#[id = "..."]`) the host uses to save and
//! recall presets, a range, and a default. Once published, never change
//! the IDs or existing sessions will lose their settings.
//!
//! ## Who clamps, who smooths
//!
//! nih-plug keeps every value inside its declared range, so the DSP core
//! never clamps. Delay time deliberately has *no* host-side smoother: the
//! core runs its own one-pole smoother on it (see
//! [`smoother`](crate::dsp::smoother)), and stacking two smoothers would
//! change the glide.
//!
//! ## Decoupling from the host
//!
//! The core does not know about `FloatParam`. It reads values through the
//! [`DelayControls`] trait, which `PluginParams` implements with plain
//! atomic loads and [`DelaySettings`] implements with fixed numbers for
//! offline rendering and tests.

use nih_plug::prelude::*;

use crate::dsp::processor::MAX_DELAY_TIME;

/// Lowest dry/wet value. The mix never goes fully dry.
pub const MIN_DRY_WET: f32 = 0.01;
/// Highest feedback gain. Staying below 1.0 keeps the loop decaying.
pub const MAX_FEEDBACK: f32 = 0.98;
/// Shortest delay time, in seconds.
pub const MIN_DELAY_TIME: f32 = 0.01;

/// Read-only view of the three delay parameters, sampled once per audio
/// sample by the core.
///
/// Implementations must be cheap and non-blocking: they are called from the
/// audio thread.
pub trait DelayControls {
    /// Dry/wet blend in `[MIN_DRY_WET, 1.0]`.
    fn dry_wet(&self) -> f32;
    /// Feedback gain in `[0.0, MAX_FEEDBACK]`.
    fn feedback(&self) -> f32;
    /// Target delay time in seconds, `[MIN_DELAY_TIME, MAX_DELAY_TIME]`.
    fn delay_time(&self) -> f32;
}

/// A fixed set of parameter values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelaySettings {
    pub dry_wet: f32,
    pub feedback: f32,
    pub delay_time: f32,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            dry_wet: 0.5,
            feedback: 0.5,
            delay_time: 0.5,
        }
    }
}

impl DelayControls for DelaySettings {
    fn dry_wet(&self) -> f32 {
        self.dry_wet
    }

    fn feedback(&self) -> f32 {
        self.feedback
    }

    fn delay_time(&self) -> f32 {
        self.delay_time
    }
}

/// All user-facing parameters for the DDL Delay plugin.
///
/// The `#[derive(Params)]` macro registers these with the host, handles
/// preset serialization, and exposes them to automation.
#[derive(Params)]
pub struct PluginParams {
    /// **DryWet**: the balance between the original and delayed signal.
    ///
    /// - 1% = almost entirely the original signal
    /// - 50% = equal blend (default)
    /// - 100% = only the echoes
    #[id = "drywet"]
    pub dry_wet: FloatParam,

    /// **Feedback**: how much of each echo is sent back into the delay line.
    ///
    /// - 0% = a single echo
    /// - 50% = each repeat at half the level of the one before (default)
    /// - 98% = very long, slowly fading repeats
    ///
    /// Capped at 98%. At 100% the echoes would never die out.
    #[id = "feedback"]
    pub feedback: FloatParam,

    /// **Delay Time**: the gap between the original and the first echo,
    /// from 10 ms up to the buffer length.
    #[id = "delaytime"]
    pub delay_time: FloatParam,
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            dry_wet: FloatParam::new(
                "DryWet",
                0.5,
                FloatRange::Linear {
                    min: MIN_DRY_WET,
                    max: 1.0,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            feedback: FloatParam::new(
                "Feedback",
                0.5,
                FloatRange::Linear {
                    min: 0.0,
                    max: MAX_FEEDBACK,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            // No `.with_smoother()`: the core smooths delay time itself.
            delay_time: FloatParam::new(
                "Delay Time",
                0.5,
                FloatRange::Linear {
                    min: MIN_DELAY_TIME,
                    max: MAX_DELAY_TIME,
                },
            )
            .with_unit(" s")
            .with_value_to_string(formatters::v2s_f32_rounded(3))
            .with_step_size(0.001),
        }
    }
}

impl DelayControls for PluginParams {
    fn dry_wet(&self) -> f32 {
        self.dry_wet.value()
    }

    fn feedback(&self) -> f32 {
        self.feedback.value()
    }

    fn delay_time(&self) -> f32 {
        self.delay_time.value()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PluginParams::default();

        assert_eq!(params.dry_wet(), 0.5);
        assert_eq!(params.feedback(), 0.5);
        assert_eq!(params.delay_time(), 0.5);
        assert_eq!(DelaySettings::default(), DelaySettings {
            dry_wet: 0.5,
            feedback: 0.5,
            delay_time: 0.5,
        });
    }

    /// The normalized ends of each knob map onto the documented ranges.
    #[test]
    fn test_ranges() {
        let params = PluginParams::default();

        let ends = |param: &FloatParam| (param.preview_plain(0.0), param.preview_plain(1.0));

        let (lo, hi) = ends(&params.dry_wet);
        assert!((lo - MIN_DRY_WET).abs() < 1e-6 && (hi - 1.0).abs() < 1e-6);

        let (lo, hi) = ends(&params.feedback);
        assert!(lo.abs() < 1e-6 && (hi - MAX_FEEDBACK).abs() < 1e-6);
        assert!(hi < 1.0, "feedback must stay below unity");

        let (lo, hi) = ends(&params.delay_time);
        assert!((lo - MIN_DELAY_TIME).abs() < 1e-6);
        assert!((hi - MAX_DELAY_TIME).abs() < 1e-6);
    }
}
