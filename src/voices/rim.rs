//! Rim click voice.
//!
//! The shortest hit in the kit: a 30 ms noise burst through a narrow
//! bandpass at 3.2 kHz with a 1 ms attack. Dry only.

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

pub fn rim(hit: &Hit) -> Vec<Layer> {
    let click = NoiseNode::new(hit.noise(0.03))
        .through(FilterNode::bandpass(3200.0, 2.0))
        .amplify(EnvNode::breakpoints(&[
            Breakpoint::Exp(0.001, 0.55),
            Breakpoint::Exp(0.03, GAIN_FLOOR),
        ]));

    vec![Layer::new(click.boxed(), hit.sends.dry_only())]
}
