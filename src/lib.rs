//! Loop-based multi-track chord sequencer.
//!
//! Pads trigger chords and drum hits, the recorder quantizes them into
//! per-track event lists, and the loop scheduler replays those events once
//! per cycle through the synthesis voice engine. The offline bouncer drives
//! the same engine to render one loop to a WAV file.

pub mod bounce;
pub mod config;
pub mod dsp; // Signal-processing primitives
pub mod engine; // Voice pool, sample clock, command queue
pub mod error;
pub mod graph; // Composable voice graph nodes
pub mod io;
pub mod mic;
pub mod mixer;
pub mod preset;
pub mod sequencer; // Tracks, transport, scheduling and recording
pub mod session;
pub mod synth; // Voice engines built from graph nodes
pub mod theory;
pub mod voices; // Percussion recipes

pub use error::{Error, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Positive floor that exponential gain automation starts from and decays to.
pub const GAIN_FLOOR: f32 = 1.0e-4;
