use crate::graph::node::{GraphNode, Release, RenderCtx, VoiceState};

/*
Serial Signal Chain (Through)
=============================

Through connects two nodes in series, passing the output of the first (source)
into the second (effect): render the source into the output buffer, then let
the effect process that buffer in place.

  Through: [Source] ──→ [Effect] ──→ output

  Amplify: [Signal] ──┬──→ (×) ──→ output
           [Mod]    ──┘

  Sum:     [A] ──┬──→ (+) ──→ output
           [B] ──┘

Every chord voice is a Through chain:

  partials.amplify(env)
      .through(FilterNode::lowpass(cutoff, q))     // tone
      .through(FilterNode::peaking(f, q, gain))    // body resonance
      .through(DriveNode::tanh(1.0 + 2.0 * drive)) // grit

Release requests reach both halves, and the chain stays active while either
half is.
*/

pub struct Through<S, F> {
    source: S,
    filter: F,
}

impl<S, F> Through<S, F> {
    pub fn new(source: S, filter: F) -> Self {
        Self { source, filter }
    }
}

impl<S: GraphNode, F: GraphNode> GraphNode for Through<S, F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);
        self.filter.render_block(out, ctx);
    }

    fn note_off(&mut self, release: &Release) {
        self.source.note_off(release);
        self.filter.note_off(release);
    }

    fn is_active(&self) -> bool {
        self.source.is_active() || self.filter.is_active()
    }

    fn stage(&self) -> Option<VoiceState> {
        self.source.stage().or_else(|| self.filter.stage())
    }
}
