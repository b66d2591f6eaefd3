use crate::{
    graph::node::{GraphNode, Release, RenderCtx, VoiceState},
    MAX_BLOCK_SIZE,
};

/*
Parallel Summing
================

`Sum` adds any number of sources sample by sample. It is how an additive
voice is assembled: one OscNode per partial, each with its own gain, plus an
optional noise transient, all summed before the shared envelope.

  partial 1 (f,   gain .22)  ──┐
  partial 2 (2f,  gain .12)  ──┤
  partial 3 (3f,  gain .06)  ──┼──→ (+) ──→ envelope ──→ filters
  ...                          │
  noise transient            ──┘

Unlike a crossfade, summing does not normalize: the per-source gains decide
the balance and the headroom. Preset gains are chosen so a full chord stays
well below clipping before the master bus.
*/

pub struct Sum {
    sources: Vec<Box<dyn GraphNode>>,
    temp_buffer: Vec<f32>,
}

impl Sum {
    pub fn new(sources: Vec<Box<dyn GraphNode>>) -> Self {
        Self {
            sources,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn push<N: GraphNode + 'static>(&mut self, source: N) {
        self.sources.push(Box::new(source));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl GraphNode for Sum {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        out.fill(0.0);
        let frames = &mut self.temp_buffer[..out.len()];

        for source in &mut self.sources {
            frames.fill(0.0);
            source.render_block(frames, ctx);
            for (o, s) in out.iter_mut().zip(frames.iter()) {
                *o += *s;
            }
        }
    }

    fn note_off(&mut self, release: &Release) {
        for source in &mut self.sources {
            source.note_off(release);
        }
    }

    fn stage(&self) -> Option<VoiceState> {
        self.sources.iter().find_map(|source| source.stage())
    }

    fn is_active(&self) -> bool {
        self.sources.iter().any(|source| source.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::oscillator::OscNode;

    #[test]
    fn sums_sources() {
        let ctx = RenderCtx::new(48_000.0, 0.0);
        let mut single = OscNode::sine(440.0);
        let mut summed = Sum::new(vec![
            Box::new(OscNode::sine(440.0).with_gain(0.5)),
            Box::new(OscNode::sine(440.0).with_gain(0.25)),
        ]);

        let mut a = vec![0.0; 256];
        let mut b = vec![0.0; 256];
        single.render_block(&mut a, &ctx);
        summed.render_block(&mut b, &ctx);

        for (x, y) in a.iter().zip(&b) {
            assert!((x * 0.75 - y).abs() < 1e-5);
        }
    }

    #[test]
    fn empty_sum_is_silent() {
        let mut sum = Sum::new(Vec::new());
        let mut buffer = vec![1.0; 64];
        sum.render_block(&mut buffer, &RenderCtx::new(48_000.0, 0.0));
        assert!(buffer.iter().all(|&x| x == 0.0));
        assert!(sum.is_empty());
        assert!(!sum.is_active());
    }
}
