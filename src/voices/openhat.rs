//! Open hi-hat voice.
//!
//! Same idea as the closed hat with a lower highpass (5.2 kHz), a quieter
//! peak and a 220 ms tail, and it does reach the reverb.

use crate::{
    graph::{
        envelope::{Breakpoint, EnvNode},
        extensions::NodeExt,
        filter::FilterNode,
        noise::NoiseNode,
    },
    synth::voice::Layer,
    voices::Hit,
    GAIN_FLOOR,
};

pub fn openhat(hit: &Hit) -> Vec<Layer> {
    let hat = NoiseNode::new(hit.noise(0.22))
        .through(FilterNode::highpass(5200.0, 1.0))
        .amplify(EnvNode::breakpoints(&[
            Breakpoint::Exp(0.002, 0.40),
            Breakpoint::Exp(0.22, GAIN_FLOOR),
        ]));

    vec![Layer::new(hat.boxed(), hit.sends)]
}
