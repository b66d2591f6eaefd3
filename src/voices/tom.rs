//! Tom drum voice.
//!
//! A pitched drum like the kick, an octave up: a sine sweeping 220 Hz →
//! 120 Hz over 120 ms, softened by a 1.2 kHz lowpass after the envelope.

use crate::{
    graph::{
        envelope::{Breakpoint, EnvNode},
        extensions::NodeExt,
        filter::FilterNode,
        oscillator::OscNode,
    },
    synth::voice::Layer,
    voices::Hit,
    GAIN_FLOOR,
};

pub fn tom(hit: &Hit) -> Vec<Layer> {
    let tom = OscNode::sine(220.0)
        .sweep_to(120.0, 0.12)
        .amplify(EnvNode::breakpoints(&[
            Breakpoint::Exp(0.004, 0.75),
            Breakpoint::Exp(0.20, GAIN_FLOOR),
        ]))
        .through(FilterNode::lowpass(1200.0, 1.0));

    vec![Layer::new(tom.boxed(), hit.sends)]
}
