use crate::{
    graph::{
        envelope::EnvNode, extensions::NodeExt, filter::FilterNode, mix::Sum,
        oscillator::OscNode, GraphNode,
    },
    preset::OscillatorParams,
};

/// Level the shared envelope peaks at before velocity.
const PEAK: f32 = 0.78;
const LOWPASS_Q: f32 = 0.6;

/// A whole chord on one envelope: one oscillator per frequency with the
/// preset waveform, each detuned (index - 1) * 4 cents. Strummed chords
/// stagger the oscillator starts by `strum_step` but share the envelope.
pub fn chord(
    params: &OscillatorParams,
    frequencies: &[f32],
    length: Option<f64>,
    velocity: f32,
    strum_step: Option<f64>,
) -> Box<dyn GraphNode> {
    let velocity = velocity.clamp(0.0, 1.0);
    let mut oscillators = Sum::new(Vec::with_capacity(frequencies.len()));

    for (idx, &frequency) in frequencies.iter().enumerate() {
        let start = strum_step.map_or(0.0, |step| idx as f64 * step);
        oscillators.push(
            OscNode::new(params.waveform, frequency)
                .with_detune((idx as f32 - 1.0) * 4.0)
                .with_gain(params.voice_gain)
                .starting_at(start),
        );
    }

    let env = &params.envelope;
    let level = PEAK * velocity;
    let mut envelope = EnvNode::adsr(
        env.attack,
        env.decay,
        level,
        level * env.sustain,
        env.release,
    );
    if let Some(length) = length {
        envelope = envelope.release_after(length);
    }

    oscillators
        .amplify(envelope)
        .through(FilterNode::lowpass(params.cutoff, LOWPASS_Q))
        .boxed()
}
