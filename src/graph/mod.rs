//! Composable building blocks for voice graphs.
//!
//! Graph nodes wrap the low-level DSP primitives with what a voice needs:
//! voice-local time, block rendering, release requests and an activity flag
//! the engine uses to reclaim finished voices. The `extensions` module adds
//! fluent helpers so voices read as a signal chain.

/// Multiply a signal by an envelope.
pub mod amplify;
/// Tanh drive stage.
pub mod distortion;
/// Gain envelopes built on scheduled parameters.
pub mod envelope;
/// Fluent combinators (`.amplify()`, `.through()`, `.boxed()`).
pub mod extensions;
/// Biquad filter node.
pub mod filter;
/// Parallel summing of sources.
pub mod mix;
/// Core traits shared by all graph nodes.
pub mod node;
/// One-shot noise burst source.
pub mod noise;
/// Pitched oscillator source with automatable frequency.
pub mod oscillator;
/// Serial chaining of two nodes (source → effect).
pub mod through;

pub use node::{GraphNode, Release, RenderCtx, VoiceState};
