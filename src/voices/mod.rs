//! Percussive one-shot voices.
//!
//! Each drum is a fixed recipe of noise bursts and swept oscillators with
//! explicit breakpoint envelopes. There is no sustain: a hit plays its curve
//! and goes silent. Drum pads 16-23 and drum-track events both land here via
//! `DrumKind::from_index`.
//!
//! # Example
//!
//! ```ignore
//! use powerchord::voices::{DrumKind, Hit};
//! use powerchord::synth::voice::{Sends, Voice};
//!
//! let hit = Hit::new(Sends::new(0.95, 0.95 * 0.12), 44_100.0, 7);
//! let voice = Voice::new(start, DrumKind::Snare.layers(&hit));
//! ```
//!
//! Every hit sends `volume` to the dry bus and `volume * reverb` to the
//! reverb. The closed hat, the rim click and the snare's tonal body stay dry.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::noise::NoiseBuffer, synth::voice::{Layer, Sends}};

mod clap;
mod crash;
mod hihat;
mod kick;
mod openhat;
mod rim;
mod snare;
mod tom;

pub use clap::clap;
pub use crash::crash;
pub use hihat::hihat;
pub use kick::kick;
pub use openhat::openhat;
pub use rim::rim;
pub use snare::snare;
pub use tom::tom;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrumKind {
    Kick,
    Snare,
    Hat,
    OpenHat,
    Clap,
    Tom,
    Rim,
    Crash,
}

impl DrumKind {
    /// Drum pad order.
    pub const ALL: [DrumKind; 8] = [
        DrumKind::Kick,
        DrumKind::Snare,
        DrumKind::Hat,
        DrumKind::OpenHat,
        DrumKind::Clap,
        DrumKind::Tom,
        DrumKind::Rim,
        DrumKind::Crash,
    ];

    /// Drum for a voice index; indices wrap around the kit.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            DrumKind::Kick => "kick",
            DrumKind::Snare => "snare",
            DrumKind::Hat => "hat",
            DrumKind::OpenHat => "openhat",
            DrumKind::Clap => "clap",
            DrumKind::Tom => "tom",
            DrumKind::Rim => "rim",
            DrumKind::Crash => "crash",
        }
    }

    pub fn layers(self, hit: &Hit) -> Vec<Layer> {
        match self {
            DrumKind::Kick => kick(hit),
            DrumKind::Snare => snare(hit),
            DrumKind::Hat => hihat(hit),
            DrumKind::OpenHat => openhat(hit),
            DrumKind::Clap => clap(hit),
            DrumKind::Tom => tom(hit),
            DrumKind::Rim => rim(hit),
            DrumKind::Crash => crash(hit),
        }
    }
}

impl fmt::Display for DrumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a recipe needs besides its own constants.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub sends: Sends,
    pub sample_rate: f32,
    pub seed: u64,
}

impl Hit {
    pub fn new(sends: Sends, sample_rate: f32, seed: u64) -> Self {
        Self {
            sends,
            sample_rate,
            seed,
        }
    }

    /// Seeded burst for this hit.
    pub(crate) fn noise(&self, seconds: f32) -> NoiseBuffer {
        NoiseBuffer::faded(seconds, self.sample_rate, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::voice::Voice;

    fn render_hit(kind: DrumKind) -> (Vec<f32>, Vec<f32>, Voice) {
        let sr = 44_100.0;
        let hit = Hit::new(Sends::new(1.0, 0.5), sr, 3);
        let mut voice = Voice::new(0.0, kind.layers(&hit));
        let mut dry = Vec::new();
        let mut wet = Vec::new();
        let mut scratch = [0.0; 256];
        // 0.6 s covers the longest tail (crash, 550 ms).
        for block in 0..104 {
            let mut d = [0.0; 256];
            let mut w = [0.0; 256];
            voice.render(block * 256, sr, &mut d, &mut w, &mut scratch);
            dry.extend_from_slice(&d);
            wet.extend_from_slice(&w);
        }
        (dry, wet, voice)
    }

    #[test]
    fn index_wraps_around_the_kit() {
        assert_eq!(DrumKind::from_index(0), DrumKind::Kick);
        assert_eq!(DrumKind::from_index(7), DrumKind::Crash);
        assert_eq!(DrumKind::from_index(10), DrumKind::Hat);
        for kind in DrumKind::ALL {
            assert_eq!(DrumKind::from_index(kind.index()), kind);
        }
    }

    #[test]
    fn every_drum_sounds_and_ends() {
        for kind in DrumKind::ALL {
            let (dry, _, voice) = render_hit(kind);
            let peak = dry.iter().fold(0.0f32, |m, x| m.max(x.abs()));
            assert!(peak > 0.01, "{kind} is silent");
            assert!(voice.is_finished(), "{kind} never finished");
        }
    }

    #[test]
    fn dry_only_drums_skip_the_reverb() {
        for kind in [DrumKind::Hat, DrumKind::Rim] {
            let (_, wet, _) = render_hit(kind);
            assert!(wet.iter().all(|&x| x == 0.0), "{kind} reached the reverb");
        }
        let (_, wet, _) = render_hit(DrumKind::Kick);
        assert!(wet.iter().any(|&x| x != 0.0));
    }

    #[test]
    fn snare_body_stays_dry() {
        let hit = Hit::new(Sends::new(1.0, 0.5), 8_000.0, 1);
        let layers = snare(&hit);
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].sends(), Sends::new(1.0, 0.5));
        assert_eq!(layers[1].sends(), Sends::new(1.0, 0.0));
    }
}
