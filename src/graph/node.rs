/// Context passed to graph nodes during rendering
///
/// - sample_rate: Audio sample rate (e.g., 44100.0)
/// - time: Voice-local time in seconds of the first frame in the block.
///   Zero is the instant the voice starts sounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self { sample_rate, time }
    }

    /// Voice-local time of frame `index` within the block.
    #[inline]
    pub fn time_at(&self, index: usize) -> f64 {
        self.time + index as f64 / self.sample_rate as f64
    }

    /// Context for the block that follows `frames` frames after this one.
    pub fn advanced(&self, frames: usize) -> Self {
        Self {
            sample_rate: self.sample_rate,
            time: self.time_at(frames),
        }
    }
}

/// A request to leave the sustain phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    /// Voice-local instant the release begins.
    pub at: f64,
    /// Upper bound on the release length; `None` uses each envelope's own.
    pub fade: Option<f64>,
}

impl Release {
    pub fn natural(at: f64) -> Self {
        Self { at, fade: None }
    }

    pub fn fast(at: f64, fade: f64) -> Self {
        Self {
            at,
            fade: Some(fade),
        }
    }
}

/// Envelope phase of a sounding voice. Percussive envelopes go straight from
/// Decay to Silent; Silent is terminal.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Attack,
    Decay,
    Sustain,
    Release,
    Silent,
}

/// Core trait for audio processing graph nodes
///
/// Nodes render mono blocks and respond to release requests.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Begin releasing.
    ///
    /// Default implementation does nothing (passthrough nodes).
    fn note_off(&mut self, _release: &Release) {
        // Default: do nothing
    }

    /// Envelope phase, for nodes that own one.
    fn stage(&self) -> Option<VoiceState> {
        None
    }

    /// Check if this node still gates sound on its own
    ///
    /// Sources and filters return false and rely on the envelope that
    /// multiplies them. Voice management frees a voice once nothing in its
    /// graph is active.
    fn is_active(&self) -> bool {
        false
    }
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn note_off(&mut self, release: &Release) {
        (**self).note_off(release)
    }

    fn stage(&self) -> Option<VoiceState> {
        (**self).stage()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
