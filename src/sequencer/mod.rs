//! Tracks, transport, scheduling and recording.
//!
//! Everything here is plain data driven from the control thread; voices
//! reach the audio thread through [`crate::engine::AudioHost`].

pub mod pattern;
pub mod recorder;
pub mod scheduler;
pub mod store;
pub mod track;
pub mod transport;

pub use pattern::DrumPattern;
pub use recorder::{quantize, Recorder, Take};
pub use scheduler::{next_occurrence, voice_for, voices_for, Dispatch, LoopScheduler};
pub use store::EventStore;
pub use track::{Event, EventId, Role, Track, TrackId};
pub use transport::{LoopPosition, Transport, BEATS_PER_BAR, SUPPORTED_BARS};
