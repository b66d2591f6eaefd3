//! Clap voice.
//!
//! Band-passed noise with a stepped envelope that imitates several hands
//! landing a few milliseconds apart.
//!
//! # How It Works
//!
//! ```text
//!   0.85 ┤ /\
//!   0.60 ┤/  \     ┌─╮
//!   0.35 ┤    └────┘  ╲
//!        └─┬───────┬───┴───────→ floor @ 110 ms
//!         3 ms   20  32 ms
//! ```
//!
//! The bandpass at 1.9 kHz (Q 1.2) leaves the "crack" and drops both the
//! rumble and the hiss.

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

pub fn clap(hit: &Hit) -> Vec<Layer> {
    let clap = NoiseNode::new(hit.noise(0.12))
        .through(FilterNode::bandpass(1900.0, 1.2))
        .amplify(EnvNode::breakpoints(&[
            Breakpoint::Exp(0.003, 0.85),
            Breakpoint::Set(0.020, 0.35),
            Breakpoint::Set(0.032, 0.60),
            Breakpoint::Exp(0.11, GAIN_FLOOR),
        ]));

    vec![Layer::new(clap.boxed(), hit.sends)]
}
