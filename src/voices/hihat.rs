//! Hi-hat voice (closed).
//!
//! A tight 60 ms burst of noise above 7 kHz, gone within 45 ms. Dry only:
//! closed hats in the reverb smear the groove.

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

pub fn hihat(hit: &Hit) -> Vec<Layer> {
    let hat = NoiseNode::new(hit.noise(0.06))
        .through(FilterNode::highpass(7000.0, 1.0))
        .amplify(EnvNode::breakpoints(&[
            Breakpoint::Exp(0.002, 0.55),
            Breakpoint::Exp(0.045, GAIN_FLOOR),
        ]));

    vec![Layer::new(hat.boxed(), hit.sends.dry_only())]
}
