//! Kick drum voice.
//!
//! A sine whose pitch drops from 130 Hz to 48 Hz over 90 ms. The fast sweep
//! is the "punch"; the low end of it is the body.
//!
//! # How It Works
//!
//! 1. Sine oscillator sweeps exponentially 130 Hz → 48 Hz in 90 ms
//! 2. Gain jumps to 0.95 in 5 ms and decays to the floor by 220 ms
//! 3. Both dry and reverb sends

use crate::{
    graph::{
        envelope::{Breakpoint, EnvNode},
        extensions::NodeExt,
        oscillator::OscNode,
    },
    synth::voice::Layer,
    voices::Hit,
    GAIN_FLOOR,
};

pub fn kick(hit: &Hit) -> Vec<Layer> {
    let body = OscNode::sine(130.0)
        .sweep_to(48.0, 0.09)
        .amplify(EnvNode::breakpoints(&[
            Breakpoint::Exp(0.005, 0.95),
            Breakpoint::Exp(0.22, GAIN_FLOOR),
        ]));

    vec![Layer::new(body.boxed(), hit.sends)]
}
