//! Transport clock: tempo, loop length and play/record state.
//!
//! Time is measured against the engine clock. Beats are counted from
//! `loop_start`, the engine instant playback started (or was re-anchored).

use tracing::info;

use crate::{Error, Result};

pub const SUPPORTED_BARS: [u32; 5] = [1, 2, 4, 8, 16];
pub const BEATS_PER_BAR: u32 = 4;
pub const MIN_BPM: f64 = 60.0;
pub const MAX_BPM: f64 = 180.0;

/// Where the playhead sits inside the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopPosition {
    /// Beats since the start of the current cycle, in [0, loop beats).
    pub beat: f64,
    /// Zero-based bar within the loop.
    pub bar: u32,
    /// Completed cycles since playback started.
    pub cycle: u64,
    /// `beat / loop beats`, for drawing a playhead.
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transport {
    bpm: f64,
    bars: u32,
    playing: bool,
    recording: bool,
    loop_start: f64,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            bpm: 100.0,
            bars: 4,
            playing: false,
            recording: false,
            loop_start: 0.0,
        }
    }
}

impl Transport {
    pub fn new(bpm: f64, bars: u32) -> Result<Self> {
        let mut transport = Self::default();
        transport.set_bars(bars)?;
        transport.bpm = clamp_bpm(bpm);
        Ok(transport)
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set the tempo, clamped to [60, 180]. While playing the loop start is
    /// moved so the playhead keeps its place in the loop at `now`.
    pub fn set_bpm(&mut self, bpm: f64, now: f64) -> f64 {
        let bpm = clamp_bpm(bpm);
        if self.playing {
            let beat = self.position(now).beat;
            self.loop_start = now - beat * 60.0 / bpm;
        }
        self.bpm = bpm;
        bpm
    }

    pub fn bars(&self) -> u32 {
        self.bars
    }

    pub fn set_bars(&mut self, bars: u32) -> Result<()> {
        if !SUPPORTED_BARS.contains(&bars) {
            return Err(Error::InvalidBarCount(bars));
        }
        self.bars = bars;
        Ok(())
    }

    pub fn loop_beats(&self) -> f64 {
        (self.bars * BEATS_PER_BAR) as f64
    }

    pub fn beats_per_second(&self) -> f64 {
        self.bpm / 60.0
    }

    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats / self.beats_per_second()
    }

    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds * self.beats_per_second()
    }

    pub fn loop_seconds(&self) -> f64 {
        self.beats_to_seconds(self.loop_beats())
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn loop_start(&self) -> f64 {
        self.loop_start
    }

    pub fn start(&mut self, now: f64) {
        self.playing = true;
        self.loop_start = now;
        info!(bpm = self.bpm, bars = self.bars, "transport started");
    }

    /// Stop playback. Recording stops with it.
    pub fn stop(&mut self) {
        if self.playing || self.recording {
            info!("transport stopped");
        }
        self.playing = false;
        self.recording = false;
    }

    pub fn set_recording(&mut self, recording: bool) {
        if self.recording != recording {
            info!(recording, "record toggled");
        }
        self.recording = recording;
    }

    /// Absolute beats since the loop start.
    pub fn beat_at(&self, now: f64) -> f64 {
        self.seconds_to_beats(now - self.loop_start)
    }

    pub fn position(&self, now: f64) -> LoopPosition {
        let loop_beats = self.loop_beats();
        let absolute = self.beat_at(now).max(0.0);
        let beat = absolute.rem_euclid(loop_beats);
        LoopPosition {
            beat,
            bar: ((beat / BEATS_PER_BAR as f64) as u32).min(self.bars - 1),
            cycle: (absolute / loop_beats).floor() as u64,
            fraction: beat / loop_beats,
        }
    }
}

fn clamp_bpm(bpm: f64) -> f64 {
    if bpm.is_finite() {
        bpm.clamp(MIN_BPM, MAX_BPM)
    } else {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_length_follows_bars() {
        let mut transport = Transport::default();
        for bars in SUPPORTED_BARS {
            transport.set_bars(bars).unwrap();
            assert_eq!(transport.loop_beats(), (bars * 4) as f64);
        }
        assert!(matches!(
            transport.set_bars(3),
            Err(Error::InvalidBarCount(3))
        ));
        assert_eq!(transport.bars(), 16);
    }

    #[test]
    fn bpm_is_clamped() {
        let mut transport = Transport::default();
        assert_eq!(transport.set_bpm(20.0, 0.0), 60.0);
        assert_eq!(transport.set_bpm(400.0, 0.0), 180.0);
        assert_eq!(transport.set_bpm(f64::NAN, 0.0), 100.0);
    }

    #[test]
    fn one_bar_at_100_bpm_is_2_4_seconds() {
        let transport = Transport::new(100.0, 1).unwrap();
        assert!((transport.loop_seconds() - 2.4).abs() < 1e-12);
    }

    #[test]
    fn position_wraps_each_cycle() {
        let mut transport = Transport::new(120.0, 1).unwrap();
        transport.start(10.0);
        let pos = transport.position(10.0 + 2.5);
        assert!((pos.beat - 1.0).abs() < 1e-9);
        assert_eq!(pos.cycle, 1);
        assert_eq!(pos.bar, 0);
        assert!((pos.fraction - 0.25).abs() < 1e-9);
    }

    #[test]
    fn tempo_change_keeps_the_playhead() {
        let mut transport = Transport::new(120.0, 2).unwrap();
        transport.start(0.0);
        let before = transport.position(3.0).beat;
        transport.set_bpm(90.0, 3.0);
        let after = transport.position(3.0).beat;
        assert!((before - after).abs() < 1e-9);
        // And time now advances at the new rate.
        let later = transport.position(4.0).beat;
        assert!((later - after - 1.5).abs() < 1e-9);
    }

    #[test]
    fn stop_ends_recording() {
        let mut transport = Transport::default();
        transport.start(0.0);
        transport.set_recording(true);
        transport.stop();
        assert!(!transport.is_playing());
        assert!(!transport.is_recording());
    }
}
