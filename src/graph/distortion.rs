use crate::{
    dsp::distortion::{Oversample, WaveShaper},
    graph::node::{GraphNode, RenderCtx},
};

/*
Drive Node
==========

Saturates a voice with a tanh curve. Guitar and bass presets carry a `drive`
amount in [0, 1]; the curve drive is 1 + 2 * drive, so

  drive 0.08  (bass guitar)      1.16  barely bends the peaks
  drive 0.15  (acoustic guitar)  1.30  warm
  drive 0.28  (electric guitar)  1.56  audible grit

Voice drive runs without oversampling; the aliasing sits far below the
partials it adds. The master soft clip in the mixer uses 4x.
*/

pub struct DriveNode {
    shaper: WaveShaper,
}

impl DriveNode {
    pub fn tanh(drive: f32) -> Self {
        Self {
            shaper: WaveShaper::tanh(drive, Oversample::None),
        }
    }
}

impl GraphNode for DriveNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        self.shaper.render(out);
    }
}
