use crate::{
    dsp::noise::{note_seed, NoiseBuffer},
    graph::{
        envelope::EnvNode, extensions::NodeExt, filter::FilterNode, mix::Sum, noise::NoiseNode,
        oscillator::OscNode, GraphNode,
    },
    preset::PianoParams,
};

/// Partial multiples and their levels.
const PARTIALS: [(f32, f32); 4] = [(1.0, 1.0), (2.0, 0.45), (3.0, 0.22), (4.0, 0.12)];

const PEAK: f32 = 0.85;
const MIN_SUSTAIN: f32 = 0.001;

const HAMMER_LEVEL: f32 = 0.8;
const HAMMER_SECONDS: f32 = 0.012;
const HAMMER_CENTER: f32 = 2600.0;
const HAMMER_Q: f32 = 2.2;

/// Four detuned triangle partials under one envelope, plus a hammer click.
///
/// Simpler and brighter than the additive piano presets: no body bands and
/// no drive. The click is a 12 ms band-passed noise burst at 2.6 kHz with
/// no gain curve of its own; the envelope attack shapes it.
pub fn note(
    params: &PianoParams,
    frequency: f32,
    length: Option<f64>,
    velocity: f32,
    sample_rate: f32,
    seed: u64,
) -> Box<dyn GraphNode> {
    let velocity = velocity.clamp(0.0, 1.0);
    let mut body = Sum::new(Vec::with_capacity(PARTIALS.len() + 1));

    for (i, &(multiple, level)) in PARTIALS.iter().enumerate() {
        body.push(
            OscNode::triangle(frequency * multiple)
                .with_detune((i as f32 - 1.5) * 2.0)
                .with_gain(params.voice_gain * level),
        );
    }

    if params.hammer > 0.001 {
        let noise = NoiseBuffer::faded(HAMMER_SECONDS, sample_rate, note_seed(frequency, 0.0, seed));
        body.push(
            NoiseNode::new(noise)
                .with_gain(params.hammer * HAMMER_LEVEL * velocity)
                .through(FilterNode::bandpass(HAMMER_CENTER, HAMMER_Q)),
        );
    }

    let env = &params.envelope;
    let mut envelope = EnvNode::adsr(
        env.attack,
        env.decay,
        PEAK * velocity,
        env.sustain.max(MIN_SUSTAIN) * velocity,
        env.release,
    );
    if let Some(length) = length {
        envelope = envelope.release_after(length);
    }

    body.amplify(envelope)
        .through(FilterNode::lowpass(params.cutoff, 0.7))
        .boxed()
}
