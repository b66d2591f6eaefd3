//! Additive harmonic voice.
//!
//! The workhorse for pianos, guitars and the bass guitar. A note is a stack
//! of partials at integer multiples of the fundamental, each with its own
//! level and waveform, summed into one envelope and shaped by a resonant
//! lowpass, a few peaking "body" bands and an optional tanh drive.
//!
//! ```text
//!   partial 1 (f)   ──┐
//!   partial 2 (2f)  ──┤
//!   ...               ├──→ (+) ──→ ADSR ──→ lowpass ──→ body bands ──→ drive
//!   partial N (Nf)  ──┤
//!   pick / hammer   ──┘
//! ```
//!
//! The pick or hammer is a short band-passed noise burst with its own
//! exponential fade, mixed in before the envelope.

use crate::{
    dsp::noise::{note_seed, NoiseBuffer},
    graph::{
        distortion::DriveNode,
        envelope::{Breakpoint, EnvNode},
        extensions::NodeExt,
        filter::FilterNode,
        mix::Sum,
        noise::NoiseNode,
        oscillator::OscNode,
        GraphNode,
    },
    preset::{HarmonicParams, Transient},
    GAIN_FLOOR,
};

fn transient_node(
    transient: &Transient,
    level: f32,
    sample_rate: f32,
    seed: u64,
) -> impl GraphNode {
    let noise = NoiseBuffer::faded(transient.duration, sample_rate, seed);
    NoiseNode::new(noise)
        .through(FilterNode::bandpass(transient.frequency, transient.q))
        .amplify(EnvNode::breakpoints(&[
            Breakpoint::Set(0.0, level),
            Breakpoint::Exp(transient.duration as f64, GAIN_FLOOR),
        ]))
}

/// Build one harmonic note. `length` is the held time in seconds before
/// the natural release; `None` holds until released.
pub fn note(
    params: &HarmonicParams,
    frequency: f32,
    length: Option<f64>,
    velocity: f32,
    sample_rate: f32,
    seed: u64,
) -> Box<dyn GraphNode> {
    let velocity = velocity.clamp(0.0, 1.0);
    let mut partials = Sum::new(Vec::with_capacity(params.partials.len() + 1));

    for (i, partial) in params.partials.iter().enumerate() {
        if partial.amplitude <= 0.0 {
            continue;
        }
        let harmonic = (i + 1) as f32;
        partials.push(
            OscNode::new(partial.waveform, frequency * harmonic)
                .with_detune((i as f32 - 2.0) * params.detune)
                .with_gain(params.voice_gain * partial.amplitude),
        );
    }

    if let Some(transient) = &params.transient {
        if transient.level > 0.0 {
            let seed = note_seed(frequency, 0.0, seed);
            partials.push(transient_node(
                transient,
                transient.level * velocity,
                sample_rate,
                seed,
            ));
        }
    }

    let env = &params.envelope;
    let mut envelope = EnvNode::adsr(
        env.attack,
        env.decay,
        params.peak * velocity,
        env.sustain * velocity,
        env.release,
    );
    if let Some(length) = length {
        envelope = envelope.release_after(length);
    }

    let mut voice = partials
        .amplify(envelope)
        .through(FilterNode::lowpass(params.cutoff, params.q))
        .boxed();

    for band in params.resonances {
        voice = voice
            .through(FilterNode::peaking(band.frequency, band.q, band.gain_db))
            .boxed();
    }

    if params.drive > 0.0 {
        voice = voice.through(DriveNode::tanh(1.0 + 2.0 * params.drive)).boxed();
    }

    voice
}
