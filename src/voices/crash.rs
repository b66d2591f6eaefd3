//! Crash cymbal voice.
//!
//! A long (550 ms) noise burst band-limited between 2.5 kHz and 12 kHz.
//!
//! # Variations
//!
//! - Raise the highpass for a thinner splash
//! - Lengthen the burst and the decay together for a ride-like wash; the
//!   burst's own linear fade sets the upper bound on the tail

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

pub fn crash(hit: &Hit) -> Vec<Layer> {
    let cymbal = NoiseNode::new(hit.noise(0.55))
        .through(FilterNode::highpass(2500.0, 1.0))
        .through(FilterNode::lowpass(12_000.0, 1.0))
        .amplify(EnvNode::breakpoints(&[
            Breakpoint::Exp(0.004, 0.40),
            Breakpoint::Exp(0.55, GAIN_FLOOR),
        ]));

    vec![Layer::new(cymbal.boxed(), hit.sends)]
}
