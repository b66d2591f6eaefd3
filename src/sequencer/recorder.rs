//! Turning pad presses into recorded events.
//!
//! A chord press records an event with a provisional length straight away
//! so it starts looping on the next cycle; the release writes the real
//! length back. Drum presses record fixed-length hits, repeating while the
//! pad is held.

use super::{
    store::EventStore,
    track::{EventId, TrackId},
    transport::Transport,
};
use crate::{config::SchedulerConfig, Result};

pub const MIN_DRUM_SPEED: f64 = 0.25;
pub const MAX_DRUM_SPEED: f64 = 4.0;

/// Round `beat` to the nearest multiple of `grid`.
pub fn quantize(beat: f64, grid: f64) -> f64 {
    (beat / grid).round() * grid
}

/// Quantized length of a hold that started at loop beat `start` and ended
/// at absolute beat `now`, wrapping across the loop boundary.
pub fn held_beats(start: f64, now: f64, loop_beats: f64, grid: f64) -> f64 {
    let mut elapsed = now.rem_euclid(loop_beats) - start;
    if elapsed < 0.0 {
        elapsed += loop_beats;
    }
    quantize(elapsed, grid).clamp(grid, loop_beats)
}

pub fn clamp_drum_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.clamp(MIN_DRUM_SPEED, MAX_DRUM_SPEED)
    } else {
        1.0
    }
}

/// Recorded length of one drum hit, in beats.
pub fn drum_hit_beats(speed: f64) -> f64 {
    (0.25 / clamp_drum_speed(speed)).max(0.06)
}

/// Seconds between repeats of a held drum pad.
pub fn drum_repeat_seconds(speed: f64) -> f64 {
    (0.25 / clamp_drum_speed(speed)).max(0.055)
}

/// An event waiting for its pad to be released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Take {
    pub track: TrackId,
    pub event: EventId,
    /// Quantized loop beat the event starts on.
    pub start: f64,
}

#[derive(Debug, Clone)]
pub struct Recorder {
    grid: f64,
    provisional: f64,
}

impl Recorder {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            grid: config.quantize_grid,
            provisional: config.provisional_beats,
        }
    }

    pub fn grid(&self) -> f64 {
        self.grid
    }

    /// Whether presses should be recorded right now.
    pub fn is_capturing(transport: &Transport) -> bool {
        transport.is_recording() && transport.is_playing()
    }

    fn slot(&self, transport: &Transport, now: f64) -> f64 {
        let loop_beats = transport.loop_beats();
        quantize(transport.beat_at(now), self.grid).rem_euclid(loop_beats)
    }

    /// Record a chord press on `track`. Returns `None` when not capturing.
    pub fn press_chord(
        &self,
        store: &mut EventStore,
        transport: &Transport,
        track: TrackId,
        pad: usize,
        now: f64,
    ) -> Result<Option<Take>> {
        if !Self::is_capturing(transport) {
            return Ok(None);
        }
        let start = self.slot(transport, now);
        let duration = self.provisional.min(transport.loop_beats());
        let event = store.push_event(track, start, pad, duration, transport.loop_beats())?;
        Ok(Some(Take {
            track,
            event,
            start,
        }))
    }

    /// Write the held length of `take` back to its event. Returns the
    /// length, or `None` if capture stopped or the event was cleared.
    pub fn release(
        &self,
        store: &mut EventStore,
        transport: &Transport,
        take: &Take,
        now: f64,
    ) -> Option<f64> {
        if !Self::is_capturing(transport) {
            return None;
        }
        let beats = held_beats(
            take.start,
            transport.beat_at(now),
            transport.loop_beats(),
            self.grid,
        );
        store
            .set_duration(take.track, take.event, beats)
            .then_some(beats)
    }

    /// Record one drum hit on `track` for drum slot `slot`.
    pub fn hit_drum(
        &self,
        store: &mut EventStore,
        transport: &Transport,
        track: TrackId,
        slot: usize,
        speed: f64,
        now: f64,
    ) -> Result<Option<EventId>> {
        if !Self::is_capturing(transport) {
            return Ok(None);
        }
        let start = self.slot(transport, now);
        let id = store.push_event(
            track,
            start,
            slot,
            drum_hit_beats(speed),
            transport.loop_beats(),
        )?;
        Ok(Some(id))
    }
}
