//! Click sound using the Web Audio API
//!
//! Procedurally generated tone - no external files needed!

use serde::{Deserialize, Serialize};

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// A single enveloped oscillator note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tone {
    /// Frequency in Hz
    pub frequency: f32,
    pub waveform: Waveform,
    /// Starting gain (0.0 - 1.0)
    pub gain: f32,
    /// Gain at the end of the exponential ramp
    pub end_gain: f32,
    /// Seconds until the oscillator stops
    pub duration: f64,
}

impl Default for Tone {
    /// Short 800 Hz beep
    fn default() -> Self {
        Self {
            frequency: 800.0,
            waveform: Waveform::Sine,
            gain: 0.3,
            end_gain: 0.01,
            duration: 0.1,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{Tone, Waveform};
    use crate::platform::AudioSink;

    impl Waveform {
        fn oscillator_type(self) -> OscillatorType {
            match self {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Triangle => OscillatorType::Triangle,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
            }
        }
    }

    /// Audio output through an AudioContext; silent if none could be created
    pub struct WebAudio {
        ctx: Option<AudioContext>,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }
    }

    impl AudioSink for WebAudio {
        fn play_tone(&self, tone: &Tone) {
            let Some(ctx) = &self.ctx else { return };

            // Browsers keep the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let Some((osc, gain)) =
                self.create_osc(ctx, tone.frequency, tone.waveform.oscillator_type())
            else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(tone.gain, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(tone.end_gain, t + tone.duration)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + tone.duration).ok();
        }
    }
}
