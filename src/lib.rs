//! # DDL Delay: A Stereo Digital Delay Line (AU/VST3/CLAP)
//!
//! A classic digital delay built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug). The incoming stereo
//! signal is recorded into a pair of ring buffers, played back after a
//! smoothly adjustable delay, partly fed back into the buffers for repeating
//! echoes, and blended with the dry signal.
//!
//! ## Layout
//!
//! - [`dsp`]: the real-time core. Host-agnostic and usable on its own.
//! - [`params`]: the three host parameters (dry/wet, feedback, delay time).
//! - [`error`]: configuration errors reported while preparing.
//!
//! This file is only the adapter: it tells the host what the plugin looks
//! like and forwards each audio block to [`DelayProcessor`].
//!
//! ## Using the core without a host
//!
//! ```
//! use ddl_delay::{dsp::processor::DelayProcessor, params::DelaySettings};
//!
//! let settings = DelaySettings { dry_wet: 1.0, feedback: 0.0, delay_time: 0.01 };
//! let mut delay = DelayProcessor::new();
//! delay.prepare(1000.0, 64, &settings).unwrap();
//!
//! let mut left = vec![0.0; 64];
//! let mut right = vec![0.0; 64];
//! left[0] = 1.0;
//! delay.process_block(&mut left, &mut right, &settings);
//!
//! // 10 ms at 1 kHz is 10 samples.
//! assert!((left[10] - 1.0).abs() < 1e-4);
//! ```

pub mod dsp;
pub mod error;
pub mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::processor::DelayProcessor;
use nih_plug::prelude::*;
use params::PluginParams;

/// The main plugin struct.
///
/// Parameters (`PluginParams`) are shared with the host via `Arc` and may be
/// written from the UI or automation thread at any time. The processor is
/// owned exclusively by the audio thread and only touched from
/// `initialize()`, `reset()`, `deactivate()` and `process()`, which the host
/// never runs concurrently.
pub struct DdlDelay {
    params: Arc<PluginParams>,
    processor: DelayProcessor,
}

impl Default for DdlDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            // No buffers yet. They are sized in initialize() once the
            // sample rate is known.
            processor: DelayProcessor::new(),
        }
    }
}

impl Plugin for DdlDelay {
    const NAME: &'static str = "DDL Delay";
    const VENDOR: &'static str = "DDL Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo in, stereo out. Both buffers share one write head, so the
    // core only makes sense for exactly two channels.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    }];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Automation lands on the exact sample it was written for. The core
    // reads every parameter once per sample, so it picks changes up
    // immediately.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called when the plugin is activated or the audio configuration
    /// changes. This is the only place the delay buffers are allocated.
    ///
    /// Returning `false` tells the host the configuration cannot be used,
    /// which happens only for a sample rate too low to hold a single sample
    /// of delay.
    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let result = self.processor.prepare(
            buffer_config.sample_rate,
            buffer_config.max_buffer_size as usize,
            self.params.as_ref(),
        );

        match result {
            Ok(()) => {
                nih_log!(
                    "Delay line ready: {} samples per channel at {} Hz",
                    self.processor.capacity(),
                    buffer_config.sample_rate
                );
                true
            }
            Err(err) => {
                nih_error!("Failed to prepare delay line: {err}");
                false
            }
        }
    }

    /// Called when playback stops or the plugin is bypassed, and right
    /// after `initialize()`. Runs on the audio thread, so it clears the
    /// existing buffers instead of reallocating them.
    fn reset(&mut self) {
        self.processor.reset(self.params.as_ref());
    }

    /// Called when the host deactivates the plugin. The buffers are freed
    /// and rebuilt by the next `initialize()`.
    fn deactivate(&mut self) {
        self.processor.release();
        nih_log!("Delay line released");
    }

    /// Forward the block to the delay core, processing both channels in
    /// place.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let [left, right, ..] = buffer.as_slice() else {
            // Only the stereo layout is advertised; anything else passes
            // through untouched.
            return ProcessStatus::Normal;
        };

        self.processor.process_block(left, right, self.params.as_ref());

        // Keep the host calling process() while the echoes ring out after
        // the input goes silent.
        ProcessStatus::Tail(self.processor.tail_samples(self.params.as_ref()))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for DdlDelay {
    const CLAP_ID: &'static str = "com.ddl-audio.ddl-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A stereo digital delay with feedback and smoothed delay time");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for DdlDelay {
    // Must be globally unique across all VST3 plugins.
    const VST3_CLASS_ID: [u8; 16] = *b"DdlStereoDelay01";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts,
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts, and
// clap_wrapper re-exports the CLAP entry point as an AUv2 component for
// Logic Pro.

nih_export_clap!(DdlDelay);
nih_export_vst3!(DdlDelay);

clap_wrapper::export_auv2!();
