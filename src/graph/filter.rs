use crate::{
    dsp::filter::Biquad,
    graph::node::{GraphNode, RenderCtx},
};

/*
Filter Node
===========

Wraps a `Biquad` so it can sit in a voice chain with `.through()`. Voices use
four responses:

  Lowpass    the tone control of every chord voice; cutoff per preset
             (650 Hz bass guitar, 2400 Hz classic piano, 3200 Hz electric)
  Highpass   drums: removes the body of noise bursts for hats and cymbals
  Bandpass   pick, hammer and clap transients; snare rattle
  Peaking    body resonances of the guitar and piano presets, a few dB
             of boost at fixed frequencies

Coefficients are fixed for the life of a voice and designed on the first
block, once the sample rate is known.

Example usage:
  let body = partials
      .amplify(env)
      .through(FilterNode::lowpass(2600.0, 0.6))
      .through(FilterNode::peaking(180.0, 1.0, 5.0))
      .through(FilterNode::peaking(700.0, 1.2, 3.5));
*/

pub struct FilterNode {
    filter: Biquad,
}

impl FilterNode {
    pub fn new(filter: Biquad) -> Self {
        Self { filter }
    }

    pub fn lowpass(cutoff: f32, q: f32) -> Self {
        Self::new(Biquad::lowpass(cutoff, q))
    }

    pub fn highpass(cutoff: f32, q: f32) -> Self {
        Self::new(Biquad::highpass(cutoff, q))
    }

    pub fn bandpass(center: f32, q: f32) -> Self {
        Self::new(Biquad::bandpass(center, q))
    }

    pub fn peaking(center: f32, q: f32, gain_db: f32) -> Self {
        Self::new(Biquad::peaking(center, q, gain_db))
    }
}

impl GraphNode for FilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.filter.render(out, ctx.sample_rate);
    }
}
