//! Voice construction.
//!
//! Turns a chord request (frequencies, start, length, velocity, sends) and a
//! preset into a `Voice` the engine can render. Engines are a closed set, so
//! dispatch is one exhaustive match; drums go through `voices::DrumKind`.

use tracing::debug;

use crate::{
    graph::GraphNode,
    preset::{Engine, Preset},
    voices::{DrumKind, Hit},
};

pub mod harmonic;
pub mod oscillator;
pub mod piano;
pub mod pluck;
pub mod voice;

pub use voice::{Layer, Sends, Voice, VoiceId};

/// Settings shared by every voice built for one engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthCtx {
    pub sample_rate: f32,
    /// Seconds between successive notes of a strummed chord.
    pub strum_step: f64,
    /// Heavier damping on plucked strings.
    pub safe_mode: bool,
}

impl SynthCtx {
    pub fn new(sample_rate: f32, strum_step: f64) -> Self {
        Self {
            sample_rate,
            strum_step,
            safe_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChordRequest<'a> {
    pub frequencies: &'a [f32],
    /// Engine time in seconds.
    pub start: f64,
    /// Seconds held before the natural release, or `None` to hold until
    /// released.
    pub length: Option<f64>,
    pub velocity: f32,
    pub sends: Sends,
    pub strum: bool,
    /// Seeds the noise transients so repeated renders match.
    pub seed: u64,
}

/// Build the voice for a chord under `preset`.
pub fn chord_voice(preset: &Preset, request: &ChordRequest<'_>, ctx: &SynthCtx) -> Voice {
    let strum = request.strum
        && preset.instrument.supports_strum()
        && request.frequencies.len() > 1;
    let step = strum.then_some(ctx.strum_step);
    let sr = ctx.sample_rate;

    let layers = match &preset.engine {
        Engine::Harmonic(params) => per_note(request, step, |f| {
            harmonic::note(params, f, request.length, request.velocity, sr, request.seed)
        }),
        Engine::Piano(params) => per_note(request, step, |f| {
            piano::note(params, f, request.length, request.velocity, sr, request.seed)
        }),
        Engine::Pluck(params) => {
            let params = if ctx.safe_mode { params.safe() } else { *params };
            per_note(request, step, |f| {
                pluck::note(&params, f, request.length, request.velocity, sr, request.seed)
            })
        }
        Engine::Oscillator(params) => {
            let node = oscillator::chord(
                params,
                request.frequencies,
                request.length,
                request.velocity,
                step,
            );
            vec![Layer::new(node, request.sends)]
        }
        Engine::Percussive | Engine::Input => {
            debug!(
                instrument = preset.instrument.id(),
                "instrument has no chord engine, using fallback oscillator"
            );
            return chord_voice(&Preset::fallback(), request, ctx);
        }
    };

    Voice::new(request.start, layers)
}

/// One layer per frequency, the k-th delayed by k strum steps.
fn per_note(
    request: &ChordRequest<'_>,
    strum_step: Option<f64>,
    build: impl Fn(f32) -> Box<dyn GraphNode>,
) -> Vec<Layer> {
    request
        .frequencies
        .iter()
        .enumerate()
        .map(|(k, &f)| {
            let offset = strum_step.map_or(0.0, |step| k as f64 * step);
            Layer::new(build(f), request.sends).delayed(offset)
        })
        .collect()
}

/// Build a one-shot drum hit. Dry send is `volume`, wet send is
/// `volume * reverb_send`.
pub fn drum_voice(
    kind: DrumKind,
    start: f64,
    volume: f32,
    reverb_send: f32,
    seed: u64,
    ctx: &SynthCtx,
) -> Voice {
    let volume = volume.clamp(0.0, 1.0);
    let sends = Sends::new(volume, volume * reverb_send.clamp(0.0, 1.0));
    let hit = Hit::new(sends, ctx.sample_rate, seed);
    Voice::new(start, kind.layers(&hit))
}
