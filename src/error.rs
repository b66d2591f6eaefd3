use std::io;

use thiserror::Error;

use crate::sequencer::track::TrackId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown key name: {0:?}")]
    UnknownKey(String),

    #[error("unsupported bar count {0} (expected one of 1, 2, 4, 8, 16)")]
    InvalidBarCount(u32),

    #[error("no track with id {0}")]
    UnknownTrack(TrackId),

    #[error("pad index {0} is out of range")]
    PadOutOfRange(usize),

    #[error("engine command queue is full")]
    QueueFull,

    #[error("microphone unavailable: {0}")]
    MicUnavailable(String),

    #[error("audio device error: {0}")]
    Device(String),

    #[error("event duration must be positive, got {0}")]
    InvalidDuration(f64),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("wav encoding failed: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
