//! Instrument catalog.
//!
//! Every instrument resolves to exactly one synthesis `Engine` with fixed
//! coefficients. Unknown ids resolve to `Instrument::Fallback`, a plain
//! triangle oscillator, so a bad id degrades a note instead of dropping it.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dsp::oscillator::Waveform;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    ClassicPiano,
    SoftPiano,
    UprightPiano,
    WarmPad,
    BrightSynth,
    AcousticGuitar,
    ElectricGuitar,
    BassGuitar,
    NylonPluck,
    PluckBass,
    DrumKit,
    Microphone,
    /// Stand-in for ids that are not in the catalog.
    Fallback,
}

impl Instrument {
    /// Instruments offered to a user, in menu order.
    pub const ALL: [Instrument; 12] = [
        Instrument::ClassicPiano,
        Instrument::SoftPiano,
        Instrument::UprightPiano,
        Instrument::WarmPad,
        Instrument::BrightSynth,
        Instrument::AcousticGuitar,
        Instrument::ElectricGuitar,
        Instrument::BassGuitar,
        Instrument::NylonPluck,
        Instrument::PluckBass,
        Instrument::DrumKit,
        Instrument::Microphone,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Instrument::ClassicPiano => "classic_piano",
            Instrument::SoftPiano => "soft_piano",
            Instrument::UprightPiano => "upright_piano",
            Instrument::WarmPad => "warm_pad",
            Instrument::BrightSynth => "bright_synth",
            Instrument::AcousticGuitar => "acoustic_guitar",
            Instrument::ElectricGuitar => "electric_guitar",
            Instrument::BassGuitar => "bass_guitar",
            Instrument::NylonPluck => "nylon_pluck",
            Instrument::PluckBass => "pluck_bass",
            Instrument::DrumKit => "drum_kit",
            Instrument::Microphone => "microphone",
            Instrument::Fallback => "fallback",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Instrument::ClassicPiano => "Classic Piano",
            Instrument::SoftPiano => "Soft Piano",
            Instrument::UprightPiano => "Upright Piano",
            Instrument::WarmPad => "Warm Pad",
            Instrument::BrightSynth => "Bright Synth",
            Instrument::AcousticGuitar => "Acoustic Guitar",
            Instrument::ElectricGuitar => "Electric Guitar",
            Instrument::BassGuitar => "Bass Guitar",
            Instrument::NylonPluck => "Nylon Pluck",
            Instrument::PluckBass => "Pluck Bass",
            Instrument::DrumKit => "Drum Kit",
            Instrument::Microphone => "Microphone",
            Instrument::Fallback => "Basic Synth",
        }
    }

    pub fn supports_strum(self) -> bool {
        matches!(
            self,
            Instrument::AcousticGuitar | Instrument::ElectricGuitar | Instrument::NylonPluck
        )
    }

    /// Resolve an id, falling back to the basic oscillator for unknown ids.
    pub fn lookup(id: &str) -> Self {
        id.parse().unwrap_or_else(|_| {
            warn!(instrument = id, "unknown instrument id, using fallback oscillator");
            Instrument::Fallback
        })
    }

    pub fn preset(self) -> Preset {
        Preset::for_instrument(self)
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Instrument::ClassicPiano
    }
}

impl FromStr for Instrument {
    type Err = UnknownInstrument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instrument::ALL
            .into_iter()
            .find(|instrument| instrument.id() == s)
            .ok_or_else(|| UnknownInstrument(s.to_string()))
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownInstrument(pub String);

impl fmt::Display for UnknownInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown instrument id {:?}", self.0)
    }
}

impl std::error::Error for UnknownInstrument {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f32,
    pub release: f64,
}

/// One harmonic of an additive voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub amplitude: f32,
    pub waveform: Waveform,
}

/// Peaking band modelling a body resonance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resonance {
    pub frequency: f32,
    pub q: f32,
    pub gain_db: f32,
}

/// Band-passed noise at note onset (pick or hammer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transient {
    pub level: f32,
    pub duration: f32,
    pub frequency: f32,
    pub q: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicParams {
    pub partials: &'static [Partial],
    /// Cents per partial step; partial i is detuned by (i - 2) * detune.
    pub detune: f32,
    pub voice_gain: f32,
    pub peak: f32,
    pub envelope: Adsr,
    pub cutoff: f32,
    pub q: f32,
    pub transient: Option<Transient>,
    pub resonances: &'static [Resonance],
    /// Tanh drive amount in [0, 1]; zero bypasses the shaper.
    pub drive: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PianoParams {
    pub voice_gain: f32,
    pub envelope: Adsr,
    pub cutoff: f32,
    /// Hammer click level; at or below 0.001 the click is skipped.
    pub hammer: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorParams {
    pub waveform: Waveform,
    pub voice_gain: f32,
    pub envelope: Adsr,
    pub cutoff: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PluckParams {
    pub brightness: f32,
    pub decay: f32,
    pub damp: f32,
}

impl PluckParams {
    /// Heavier damping and a darker loop, used in safe mode.
    pub fn safe(self) -> Self {
        Self {
            damp: self.damp.max(0.55),
            brightness: self.brightness.min(0.55),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Engine {
    Harmonic(HarmonicParams),
    Piano(PianoParams),
    Oscillator(OscillatorParams),
    Pluck(PluckParams),
    /// Drum recipes; chosen per hit by pad, not by preset.
    Percussive,
    /// Live input; never synthesized.
    Input,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub instrument: Instrument,
    pub engine: Engine,
}

const fn partial(amplitude: f32, waveform: Waveform) -> Partial {
    Partial {
        amplitude,
        waveform,
    }
}

const fn band(frequency: f32, q: f32, gain_db: f32) -> Resonance {
    Resonance {
        frequency,
        q,
        gain_db,
    }
}

use Waveform::{Sawtooth as Saw, Sine, Triangle as Tri};

const CLASSIC_PIANO: [Partial; 6] = [
    partial(1.00, Tri),
    partial(0.55, Tri),
    partial(0.28, Tri),
    partial(0.16, Sine),
    partial(0.10, Sine),
    partial(0.06, Sine),
];
const CLASSIC_PIANO_BODY: [Resonance; 2] = [band(520.0, 1.1, 2.0), band(1150.0, 1.4, 1.4)];

const SOFT_PIANO: [Partial; 5] = [
    partial(1.00, Tri),
    partial(0.42, Tri),
    partial(0.20, Sine),
    partial(0.10, Sine),
    partial(0.05, Sine),
];
const SOFT_PIANO_BODY: [Resonance; 2] = [band(420.0, 1.0, 1.5), band(980.0, 1.3, 1.0)];

const ACOUSTIC_GUITAR: [Partial; 6] = [
    partial(1.00, Tri),
    partial(0.75, Saw),
    partial(0.55, Saw),
    partial(0.35, Tri),
    partial(0.22, Sine),
    partial(0.14, Sine),
];
const ACOUSTIC_BODY: [Resonance; 3] = [
    band(180.0, 1.0, 5.0),
    band(700.0, 1.2, 3.5),
    band(2200.0, 1.0, 2.2),
];

const ELECTRIC_GUITAR: [Partial; 7] = [
    partial(1.00, Saw),
    partial(0.85, Saw),
    partial(0.60, Tri),
    partial(0.40, Tri),
    partial(0.25, Sine),
    partial(0.16, Sine),
    partial(0.10, Sine),
];
const ELECTRIC_BODY: [Resonance; 3] = [
    band(140.0, 0.9, 4.2),
    band(900.0, 1.1, 2.8),
    band(2600.0, 1.0, 2.6),
];

const BASS_GUITAR: [Partial; 4] = [
    partial(1.00, Sine),
    partial(0.25, Tri),
    partial(0.12, Tri),
    partial(0.05, Sine),
];
const BASS_BODY: [Resonance; 2] = [band(90.0, 0.9, 4.5), band(220.0, 1.1, 2.0)];

impl Preset {
    pub fn for_instrument(instrument: Instrument) -> Self {
        let engine = match instrument {
            Instrument::ClassicPiano => Engine::Harmonic(HarmonicParams {
                partials: &CLASSIC_PIANO,
                detune: 2.0,
                voice_gain: 0.22,
                peak: 0.9,
                envelope: Adsr {
                    attack: 0.004,
                    decay: 0.22,
                    sustain: 0.38,
                    release: 0.75,
                },
                cutoff: 2400.0,
                q: 0.75,
                transient: Some(Transient {
                    level: 0.10,
                    duration: 0.012,
                    frequency: 2800.0,
                    q: 2.0,
                }),
                resonances: &CLASSIC_PIANO_BODY,
                drive: 0.0,
            }),
            Instrument::SoftPiano => Engine::Harmonic(HarmonicParams {
                partials: &SOFT_PIANO,
                detune: 1.2,
                voice_gain: 0.20,
                peak: 0.9,
                envelope: Adsr {
                    attack: 0.010,
                    decay: 0.35,
                    sustain: 0.28,
                    release: 0.95,
                },
                cutoff: 1800.0,
                q: 0.7,
                transient: Some(Transient {
                    level: 0.05,
                    duration: 0.010,
                    frequency: 2400.0,
                    q: 1.6,
                }),
                resonances: &SOFT_PIANO_BODY,
                drive: 0.0,
            }),
            Instrument::UprightPiano => Engine::Piano(PianoParams {
                voice_gain: 0.26,
                envelope: Adsr {
                    attack: 0.005,
                    decay: 0.6,
                    sustain: 0.25,
                    release: 0.5,
                },
                cutoff: 2200.0,
                hammer: 0.6,
            }),
            Instrument::WarmPad => Engine::Oscillator(OscillatorParams {
                waveform: Waveform::Sine,
                voice_gain: 0.30,
                envelope: Adsr {
                    attack: 0.04,
                    decay: 0.10,
                    sustain: 0.92,
                    release: 0.55,
                },
                cutoff: 950.0,
            }),
            Instrument::BrightSynth => Engine::Oscillator(OscillatorParams {
                waveform: Waveform::Sawtooth,
                voice_gain: 0.22,
                envelope: Adsr {
                    attack: 0.012,
                    decay: 0.08,
                    sustain: 0.75,
                    release: 0.22,
                },
                cutoff: 1700.0,
            }),
            Instrument::AcousticGuitar => Engine::Harmonic(HarmonicParams {
                partials: &ACOUSTIC_GUITAR,
                detune: 0.0,
                voice_gain: 0.14,
                peak: 0.9,
                envelope: Adsr {
                    attack: 0.004,
                    decay: 0.18,
                    sustain: 0.18,
                    release: 0.32,
                },
                cutoff: 2600.0,
                q: 0.6,
                transient: Some(Transient {
                    level: 0.12,
                    duration: 0.018,
                    frequency: 1900.0,
                    q: 1.2,
                }),
                resonances: &ACOUSTIC_BODY,
                drive: 0.15,
            }),
            Instrument::ElectricGuitar => Engine::Harmonic(HarmonicParams {
                partials: &ELECTRIC_GUITAR,
                detune: 0.0,
                voice_gain: 0.12,
                peak: 0.9,
                envelope: Adsr {
                    attack: 0.003,
                    decay: 0.14,
                    sustain: 0.24,
                    release: 0.26,
                },
                cutoff: 3200.0,
                q: 0.55,
                transient: Some(Transient {
                    level: 0.08,
                    duration: 0.014,
                    frequency: 2400.0,
                    q: 1.4,
                }),
                resonances: &ELECTRIC_BODY,
                drive: 0.28,
            }),
            Instrument::BassGuitar => Engine::Harmonic(HarmonicParams {
                partials: &BASS_GUITAR,
                detune: 0.0,
                voice_gain: 0.28,
                peak: 0.9,
                envelope: Adsr {
                    attack: 0.010,
                    decay: 0.20,
                    sustain: 0.78,
                    release: 0.22,
                },
                cutoff: 650.0,
                q: 0.9,
                transient: Some(Transient {
                    level: 0.02,
                    duration: 0.010,
                    frequency: 900.0,
                    q: 1.0,
                }),
                resonances: &BASS_BODY,
                drive: 0.08,
            }),
            Instrument::NylonPluck => Engine::Pluck(PluckParams {
                brightness: 0.5,
                decay: 0.6,
                damp: 0.25,
            }),
            Instrument::PluckBass => Engine::Pluck(PluckParams {
                brightness: 0.3,
                decay: 0.7,
                damp: 0.4,
            }),
            Instrument::DrumKit => Engine::Percussive,
            Instrument::Microphone => Engine::Input,
            Instrument::Fallback => return Self::fallback(),
        };

        Self { instrument, engine }
    }

    /// Plain triangle oscillator used for unknown instruments.
    pub fn fallback() -> Self {
        Self {
            instrument: Instrument::Fallback,
            engine: Engine::Oscillator(OscillatorParams {
                waveform: Waveform::Triangle,
                voice_gain: 0.22,
                envelope: Adsr {
                    attack: 0.01,
                    decay: 0.08,
                    sustain: 0.7,
                    release: 0.25,
                },
                cutoff: 1400.0,
            }),
        }
    }

    /// Resolve an instrument id; unknown ids get the fallback oscillator.
    pub fn lookup(id: &str) -> Self {
        Instrument::lookup(id).preset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_instrument_round_trips_its_id() {
        for instrument in Instrument::ALL {
            assert_eq!(instrument.id().parse::<Instrument>(), Ok(instrument));
        }
    }

    #[test]
    fn unknown_id_falls_back_to_oscillator() {
        let preset = Preset::lookup("theremin");
        assert_eq!(preset.instrument, Instrument::Fallback);
        match preset.engine {
            Engine::Oscillator(params) => {
                assert_eq!(params.waveform, Waveform::Triangle);
                assert_eq!(params.cutoff, 1400.0);
            }
            other => panic!("expected oscillator fallback, got {other:?}"),
        }
    }

    #[test]
    fn only_guitars_strum() {
        let strummers: Vec<_> = Instrument::ALL
            .into_iter()
            .filter(|i| i.supports_strum())
            .collect();
        assert_eq!(
            strummers,
            vec![
                Instrument::AcousticGuitar,
                Instrument::ElectricGuitar,
                Instrument::NylonPluck
            ]
        );
    }

    #[test]
    fn classic_piano_is_additive() {
        let Engine::Harmonic(params) = Instrument::ClassicPiano.preset().engine else {
            panic!("classic piano should use the harmonic engine");
        };
        assert_eq!(params.partials.len(), 6);
        assert_eq!(params.resonances.len(), 2);
        assert_eq!(params.drive, 0.0);
    }

    #[test]
    fn safe_mode_darkens_plucks() {
        let params = PluckParams {
            brightness: 0.9,
            decay: 0.5,
            damp: 0.1,
        }
        .safe();
        assert_eq!(params.damp, 0.55);
        assert_eq!(params.brightness, 0.55);
    }
}
