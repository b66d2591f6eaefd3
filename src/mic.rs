//! Microphone input: acquisition state machine and the per-track FX chain.
//!
//! One input stream is acquired on demand and fanned out to every unmuted
//! mic-role track. Each route runs the same chain:
//!
//! ```text
//!   input × volume → compressor → peaking "tune" band ─┬──────────────────→ dry
//!                                                      ├─→ delay ⟲ fb ────→ dry
//!                                                      └─→ × reverb ──────→ wet
//! ```
//!
//! The delay sees the tuned signal plus its own feedback, and its output is
//! summed into the dry bus next to the direct path.

use std::fmt;

use rtrb::Consumer;
use tracing::{info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::CompressorConfig,
    dsp::{compressor::Compressor, delay::DelayLine, filter::Biquad},
    theory::PitchClass,
    Error, Result,
};

/// Longest echo the mic delay can produce.
const MAX_DELAY_SECONDS: f32 = 1.0;

/// User-facing mic effect amounts, each in [0, 1] except the key.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MicFx {
    pub reverb: f32,
    pub delay: f32,
    pub compression: f32,
    pub tune: f32,
    pub auto_tune: bool,
    pub tune_key: PitchClass,
}

impl Default for MicFx {
    fn default() -> Self {
        Self {
            reverb: 0.25,
            delay: 0.12,
            compression: 0.30,
            tune: 0.15,
            auto_tune: true,
            tune_key: PitchClass::C,
        }
    }
}

impl MicFx {
    pub fn compressor(&self) -> CompressorConfig {
        CompressorConfig {
            threshold_db: -34.0 + 22.0 * self.compression,
            knee_db: 30.0,
            ratio: 2.0 + 8.0 * self.compression,
            attack_seconds: 0.01,
            release_seconds: 0.16,
        }
    }

    /// Peaking band as (center Hz, Q, gain dB). Flat unless auto-tune is on.
    pub fn tune_band(&self) -> (f32, f32, f32) {
        let center = 220.0 + 40.0 * self.tune_key.semitone() as f32 + 800.0 * self.tune;
        if self.auto_tune {
            (center, 1.8 + 4.0 * self.tune, 12.0 * self.tune)
        } else {
            (center, 0.7, 0.0)
        }
    }

    pub fn delay_seconds(&self) -> f32 {
        0.03 + 0.28 * self.delay
    }

    pub fn delay_feedback(&self) -> f32 {
        0.35 * self.delay
    }
}

/// Realtime chain for one mic route. Built on the control side, then moved
/// to the audio thread.
#[derive(Debug, Clone)]
pub struct MicChain {
    input_gain: f32,
    compressor: Compressor,
    tune: Biquad,
    delay: DelayLine,
    delay_samples: f32,
    feedback: f32,
    wet: f32,
    sample_rate: f32,
}

impl MicChain {
    pub fn new(fx: &MicFx, volume: f32, sample_rate: f32) -> Self {
        let (center, q, gain_db) = fx.tune_band();
        Self {
            input_gain: volume.max(0.0),
            compressor: Compressor::new(fx.compressor(), sample_rate),
            tune: Biquad::peaking(center, q, gain_db),
            delay: DelayLine::with_max_seconds(MAX_DELAY_SECONDS, sample_rate),
            delay_samples: fx.delay_seconds() * sample_rate,
            feedback: fx.delay_feedback(),
            wet: fx.reverb.clamp(0.0, 1.0),
            sample_rate,
        }
    }

    /// Run `input` through the chain and add the result to the buses.
    pub fn process(&mut self, input: &[f32], dry: &mut [f32], wet: &mut [f32]) {
        for ((&x, d), w) in input.iter().zip(dry.iter_mut()).zip(wet.iter_mut()) {
            let x = x * self.input_gain;
            let (squeezed, _) = self.compressor.process(x, x);
            let tuned = self.tune.process(squeezed, self.sample_rate);

            let echo = self.delay.read(self.delay_samples);
            self.delay.write(tuned + self.feedback * echo);

            *d += tuned + echo;
            *w += tuned * self.wet;
        }
    }
}

/// Acquisition state of the shared input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MicState {
    Idle,
    Requesting,
    Ready,
    Failed(String),
}

impl fmt::Display for MicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MicState::Idle => f.write_str("idle"),
            MicState::Requesting => f.write_str("requesting"),
            MicState::Ready => f.write_str("ready"),
            MicState::Failed(reason) => write!(f, "unavailable ({reason})"),
        }
    }
}

/// Something that can open the default input and stream mono samples.
pub trait InputDevice {
    fn open(&mut self) -> Result<Consumer<f32>>;
}

/// Mic acquisition with a single pending request.
#[derive(Debug)]
pub struct Microphone {
    state: MicState,
}

impl Default for Microphone {
    fn default() -> Self {
        Self::new()
    }
}

impl Microphone {
    pub fn new() -> Self {
        Self {
            state: MicState::Idle,
        }
    }

    pub fn state(&self) -> &MicState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == MicState::Ready
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.state, MicState::Failed(_))
    }

    /// Ask for the input. Returns false when a request is already pending,
    /// the stream is already open, or a previous attempt failed.
    pub fn request(&mut self) -> bool {
        if self.state != MicState::Idle {
            return false;
        }
        self.state = MicState::Requesting;
        true
    }

    /// Clear a failure so the next `request` tries again.
    pub fn retry(&mut self) {
        if self.is_unavailable() {
            self.state = MicState::Idle;
        }
    }

    /// Resolve a pending request against `device`. Yields the stream exactly
    /// once, on the transition to `Ready`.
    pub fn poll(&mut self, device: Option<&mut dyn InputDevice>) -> Option<Consumer<f32>> {
        if self.state != MicState::Requesting {
            return None;
        }
        let opened = match device {
            Some(device) => device.open(),
            None => Err(Error::MicUnavailable("no input device".to_string())),
        };
        match opened {
            Ok(stream) => {
                info!("microphone ready");
                self.state = MicState::Ready;
                Some(stream)
            }
            Err(err) => {
                warn!(%err, "microphone unavailable");
                self.state = MicState::Failed(err.to_string());
                None
            }
        }
    }
}
