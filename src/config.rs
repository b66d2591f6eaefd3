//! Tunable constants for the audio engine and the loop scheduler.
//!
//! Both structs carry the values the sequencer ships with in their `Default`
//! impls. With the `serde` feature they can be loaded from any serde format.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Rate used when no device dictates one (offline bounce, tests).
    pub sample_rate: f32,
    /// Frames rendered per engine block; clamped to `MAX_BLOCK_SIZE`.
    pub block_size: usize,
    /// Master gain for live playback.
    pub master_gain: f32,
    /// Master gain for the offline bounce.
    pub bounce_master_gain: f32,
    /// Reverb return level applied to the wet bus.
    pub reverb_level: f32,
    pub reverb_seconds: f32,
    pub reverb_decay: f32,
    /// Seed for the impulse response noise.
    pub reverb_seed: u64,
    pub compressor: CompressorConfig,
    /// Drive of the tanh soft clip after the compressor.
    pub soft_clip_drive: f32,
    /// Auto-duck engages when the output RMS exceeds this level.
    pub duck_threshold_db: f32,
    pub duck_factor: f32,
    pub duck_floor: f32,
    pub duck_ramp_seconds: f64,
    pub monitor_interval_seconds: f64,
    /// Window length of the RMS level meter.
    pub meter_window: usize,
    pub panic_fade_seconds: f64,
    pub panic_restore_seconds: f64,
    /// Fade applied to every sounding voice when transport stops.
    pub stop_fade_seconds: f64,
    /// Capacity of the control-to-audio command queue.
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            block_size: 256,
            master_gain: 0.78,
            bounce_master_gain: 0.95,
            reverb_level: 1.0,
            reverb_seconds: 1.8,
            reverb_decay: 2.0,
            reverb_seed: 0x5eed_0001,
            compressor: CompressorConfig::default(),
            soft_clip_drive: 1.8,
            duck_threshold_db: -6.0,
            duck_factor: 0.85,
            duck_floor: 0.15,
            duck_ramp_seconds: 0.04,
            monitor_interval_seconds: 0.05,
            meter_window: 1024,
            panic_fade_seconds: 0.03,
            panic_restore_seconds: 0.12,
            stop_fade_seconds: 0.05,
            command_capacity: 1024,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorConfig {
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    pub attack_seconds: f32,
    pub release_seconds: f32,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            threshold_db: -18.0,
            knee_db: 20.0,
            ratio: 10.0,
            attack_seconds: 0.003,
            release_seconds: 0.25,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// How often the session expects `tick` to be called.
    pub poll_interval_seconds: f64,
    /// Events whose next occurrence is closer than this are dispatched.
    pub lookahead_seconds: f64,
    /// Tolerance, in beats, for treating an occurrence as already past.
    pub epsilon_beats: f64,
    /// Recording quantization grid in beats.
    pub quantize_grid: f64,
    /// Delay between consecutive notes of a strummed chord.
    pub strum_step_seconds: f64,
    /// Duration given to a chord event until its pad is released.
    pub provisional_beats: f64,
    pub default_bpm: f64,
    pub default_bars: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 0.035,
            lookahead_seconds: 0.14,
            epsilon_beats: 1.0e-4,
            quantize_grid: 0.25,
            strum_step_seconds: 0.018,
            provisional_beats: 1.0,
            default_bpm: 100.0,
            default_bars: 4,
        }
    }
}
