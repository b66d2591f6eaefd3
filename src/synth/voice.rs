use std::sync::atomic::{AtomicU64, Ordering};

use crate::graph::node::{GraphNode, Release, RenderCtx, VoiceState};

static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// Handle used to release a sounding voice early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(u64);

impl VoiceId {
    fn next() -> Self {
        Self(NEXT_VOICE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Gains from a layer into the dry bus and the reverb bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sends {
    pub dry: f32,
    pub wet: f32,
}

impl Sends {
    pub fn new(dry: f32, wet: f32) -> Self {
        Self { dry, wet }
    }

    /// Same dry level, nothing to the reverb.
    pub fn dry_only(self) -> Self {
        Self { wet: 0.0, ..self }
    }
}

/// One graph inside a voice: a note of a chord or a part of a drum.
pub struct Layer {
    node: Box<dyn GraphNode>,
    sends: Sends,
    /// Seconds after the voice start this layer begins (strum).
    offset: f64,
}

impl Layer {
    pub fn new(node: Box<dyn GraphNode>, sends: Sends) -> Self {
        Self {
            node,
            sends,
            offset: 0.0,
        }
    }

    pub fn delayed(mut self, offset: f64) -> Self {
        self.offset = offset.max(0.0);
        self
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn sends(&self) -> Sends {
        self.sends
    }
}

/// A scheduled sound: layers that start at one engine instant and are
/// reclaimed together once every layer has gone silent.
pub struct Voice {
    id: VoiceId,
    /// Engine time in seconds.
    start: f64,
    layers: Vec<Layer>,
    finished: bool,
}

impl Voice {
    pub fn new(start: f64, layers: Vec<Layer>) -> Self {
        Self {
            id: VoiceId::next(),
            start: start.max(0.0),
            finished: layers.is_empty(),
            layers,
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Release every layer at engine time `at`. A fast release caps the fade.
    pub fn release(&mut self, at: f64, fade: Option<f64>) {
        for layer in &mut self.layers {
            let local = at - self.start - layer.offset;
            let release = Release {
                at: local.max(0.0),
                fade,
            };
            layer.node.note_off(&release);
        }
    }

    pub fn state(&self) -> VoiceState {
        if self.finished {
            return VoiceState::Silent;
        }
        self.layers
            .iter()
            .find_map(|layer| layer.node.stage())
            .unwrap_or(VoiceState::Silent)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Mix this voice into the buses for the block starting at engine frame
    /// `block_start`. `scratch` must be at least as long as the buses.
    pub fn render(
        &mut self,
        block_start: u64,
        sample_rate: f32,
        dry: &mut [f32],
        wet: &mut [f32],
        scratch: &mut [f32],
    ) {
        if self.finished {
            return;
        }
        let frames = dry.len().min(wet.len()).min(scratch.len());
        let block_end = block_start + frames as u64;
        let mut any_active = false;

        for layer in &mut self.layers {
            let layer_start = ((self.start + layer.offset) * sample_rate as f64).round() as u64;
            if layer_start >= block_end {
                any_active = true;
                continue;
            }

            let skip = layer_start.saturating_sub(block_start) as usize;
            let first_frame = block_start + skip as u64;
            let local = (first_frame - layer_start) as f64 / sample_rate as f64;
            let ctx = RenderCtx::new(sample_rate, local);

            let buffer = &mut scratch[skip..frames];
            buffer.fill(0.0);
            layer.node.render_block(buffer, &ctx);

            let Sends { dry: dry_gain, wet: wet_gain } = layer.sends;
            for (i, &x) in buffer.iter().enumerate() {
                dry[skip + i] += x * dry_gain;
                wet[skip + i] += x * wet_gain;
            }

            any_active |= layer.node.is_active();
        }

        self.finished = !any_active;
    }
}
