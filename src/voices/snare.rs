//! Snare drum voice.
//!
//! Wire rattle plus a short tonal body. The rattle is a 180 ms noise burst
//! trimmed from below by a highpass and focused by a bandpass; the body is a
//! 220 Hz triangle that only ever goes to the dry bus, so the reverb tail is
//! all rattle.
//!
//! # How It Works
//!
//! 1. Noise → highpass 900 Hz → bandpass 1.8 kHz (Q 0.9), 0.9 peak at 4 ms,
//!    floor by 160 ms
//! 2. Triangle 220 Hz, 0.35 peak at 5 ms, floor by 120 ms, dry only

use crate::{
    graph::{
        envelope::{Breakpoint, EnvNode},
        extensions::NodeExt,
        filter::FilterNode,
        noise::NoiseNode,
        oscillator::OscNode,
    },
    synth::voice::Layer,
    voices::Hit,
    GAIN_FLOOR,
};

pub fn snare(hit: &Hit) -> Vec<Layer> {
    let rattle = NoiseNode::new(hit.noise(0.18))
        .through(FilterNode::highpass(900.0, 1.0))
        .through(FilterNode::bandpass(1800.0, 0.9))
        .amplify(EnvNode::breakpoints(&[
            Breakpoint::Exp(0.004, 0.9),
            Breakpoint::Exp(0.16, GAIN_FLOOR),
        ]));

    let body = OscNode::triangle(220.0).amplify(EnvNode::breakpoints(&[
        Breakpoint::Exp(0.005, 0.35),
        Breakpoint::Exp(0.12, GAIN_FLOOR),
    ]));

    vec![
        Layer::new(rattle.boxed(), hit.sends),
        Layer::new(body.boxed(), hit.sends.dry_only()),
    ]
}
