use crate::{
    dsp::noise::NoiseBuffer,
    graph::node::{GraphNode, RenderCtx},
};

/// Plays a pre-rendered noise burst once, starting at voice time zero.
pub struct NoiseNode {
    noise: NoiseBuffer,
    gain: f32,
}

impl NoiseNode {
    pub fn new(noise: NoiseBuffer) -> Self {
        Self { noise, gain: 1.0 }
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }
}

impl GraphNode for NoiseNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let first = (ctx.time * ctx.sample_rate as f64).round() as i64;
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.noise.sample(first + i as i64) * self.gain;
        }
    }
}
