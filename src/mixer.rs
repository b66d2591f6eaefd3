//! Master bus and safety chain.
//!
//! ```text
//!   dry bus ───────────────────────────────┐
//!                                          ├─→ master gain → compressor → tanh soft clip (4x) → out
//!   wet bus × reverb level → convolution ──┘                                       │
//!                                                                             level meter
//! ```
//!
//! The master gain is an automatable `Param` on the engine timeline. Three
//! things move it:
//!
//! - auto-duck: every 50 ms the output RMS is checked; above -6 dB the master
//!   ramps down to `max(0.15, g * 0.85)` over 40 ms. It never ramps back up.
//! - panic: master falls to the floor in 30 ms and is restored to its default
//!   120 ms later.
//! - `ensure_audible`: a master left below the duck floor snaps back to its
//!   default (used when transport starts).

use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    dsp::{
        analysis::LevelMeter,
        compressor::Compressor,
        distortion::{Oversample, WaveShaper},
        reverb::{impulse_response, Convolver},
        Param,
    },
    GAIN_FLOOR, MAX_BLOCK_SIZE,
};

struct DuckMonitor {
    interval: u64,
    countdown: u64,
    threshold_db: f32,
    factor: f32,
    floor: f32,
    ramp: f64,
}

pub struct Mixer {
    sample_rate: f32,
    reverb_level: f32,
    convolver: Convolver,
    master: Param,
    master_default: f32,
    compressor: Compressor,
    clip: [WaveShaper; 2],
    meter: LevelMeter,
    duck: DuckMonitor,
    panic_fade: f64,
    panic_restore: f64,
    gain: Vec<f32>,
    restores: u64,
    ducks: u64,
}

impl Mixer {
    /// Live mixer: master at `config.master_gain`.
    pub fn live(config: &EngineConfig, sample_rate: f32) -> Self {
        Self::new(config, sample_rate, config.master_gain)
    }

    /// Offline mixer: master at `config.bounce_master_gain`.
    pub fn offline(config: &EngineConfig, sample_rate: f32) -> Self {
        Self::new(config, sample_rate, config.bounce_master_gain)
    }

    pub fn new(config: &EngineConfig, sample_rate: f32, master_gain: f32) -> Self {
        let impulse = impulse_response(
            sample_rate,
            config.reverb_seconds,
            config.reverb_decay,
            config.reverb_seed,
        );
        let mut master = Param::new(master_gain);
        master.set_value_at(0.0, master_gain);

        let interval =
            ((config.monitor_interval_seconds * sample_rate as f64).round() as u64).max(1);

        Self {
            sample_rate,
            reverb_level: config.reverb_level.clamp(0.0, 1.0),
            convolver: Convolver::new(impulse, sample_rate),
            master,
            master_default: master_gain,
            compressor: Compressor::new(config.compressor, sample_rate),
            clip: [
                WaveShaper::tanh(config.soft_clip_drive, Oversample::X4),
                WaveShaper::tanh(config.soft_clip_drive, Oversample::X4),
            ],
            meter: LevelMeter::new(config.meter_window),
            duck: DuckMonitor {
                interval,
                countdown: interval,
                threshold_db: config.duck_threshold_db,
                factor: config.duck_factor,
                floor: config.duck_floor,
                ramp: config.duck_ramp_seconds,
            },
            panic_fade: config.panic_fade_seconds,
            panic_restore: config.panic_restore_seconds,
            gain: vec![0.0; MAX_BLOCK_SIZE],
            restores: 0,
            ducks: 0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn set_reverb_level(&mut self, level: f32) {
        self.reverb_level = level.clamp(0.0, 1.0);
    }

    pub fn reverb_level(&self) -> f32 {
        self.reverb_level
    }

    /// Master gain at engine time `time`.
    pub fn master_at(&self, time: f64) -> f32 {
        self.master.value_at(time)
    }

    pub fn master_default(&self) -> f32 {
        self.master_default
    }

    /// RMS of the output over the meter window, in dBFS.
    pub fn level_db(&self) -> f32 {
        self.meter.db()
    }

    pub fn meter(&self) -> &LevelMeter {
        &self.meter
    }

    /// Number of scheduled master restores (one per panic).
    pub fn restore_count(&self) -> u64 {
        self.restores
    }

    pub fn duck_count(&self) -> u64 {
        self.ducks
    }

    /// Pull the master down to `max(floor, g * factor)` over the duck ramp.
    pub fn duck(&mut self, time: f64) {
        let current = self.master.hold_at(time);
        let target = self.duck.floor.max(current * self.duck.factor);
        self.master.linear_ramp_to(target, time + self.duck.ramp);
        self.ducks += 1;
        debug!(from = current, to = target, "auto-duck");
    }

    /// Fade the master to silence, then restore it once.
    pub fn panic(&mut self, time: f64) {
        let current = self.master.hold_at(time).max(GAIN_FLOOR);
        self.master.set_value_at(time, current);
        self.master
            .exponential_ramp_to(GAIN_FLOOR, time + self.panic_fade)
            .set_value_at(time + self.panic_restore, self.master_default);
        self.restores += 1;
        warn!(at = time, "panic: master muted and restore scheduled");
    }

    /// Restore the master if a duck left it below the floor.
    pub fn ensure_audible(&mut self, time: f64) {
        if self.master.value_at(time) < self.duck.floor {
            self.master
                .cancel_scheduled_values(time)
                .set_value_at(time, self.master_default);
            debug!(to = self.master_default, "master restored");
        }
    }

    /// Mix one block. `time` is the engine time of the first frame.
    pub fn process(
        &mut self,
        dry: &[f32],
        wet: &[f32],
        time: f64,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        let frames = dry
            .len()
            .min(wet.len())
            .min(left.len())
            .min(right.len())
            .min(self.gain.len());
        let dt = 1.0 / self.sample_rate as f64;

        self.master.compact(time);
        let gain = &mut self.gain[..frames];
        self.master.render(gain, time, self.sample_rate);

        for i in 0..frames {
            let (reverb_l, reverb_r) = self.convolver.process(wet[i] * self.reverb_level);
            let g = self.gain[i];
            let (l, r) = self
                .compressor
                .process((dry[i] + reverb_l) * g, (dry[i] + reverb_r) * g);
            let l = self.clip[0].process(l);
            let r = self.clip[1].process(r);
            left[i] = l;
            right[i] = r;
            self.meter.push(0.5 * (l + r));

            self.duck.countdown -= 1;
            if self.duck.countdown == 0 {
                self.duck.countdown = self.duck.interval;
                if self.meter.db() > self.duck.threshold_db {
                    self.duck(time + (i + 1) as f64 * dt);
                    // Gain for the rest of the block follows the new ramp.
                    let rest = &mut self.gain[i + 1..frames];
                    self.master
                        .render(rest, time + (i + 1) as f64 * dt, self.sample_rate);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 8_000.0;

    fn config() -> EngineConfig {
        EngineConfig {
            reverb_seconds: 0.1,
            ..EngineConfig::default()
        }
    }

    fn run(mixer: &mut Mixer, dry_level: f32, seconds: f64, start: f64) -> (f64, Vec<f32>) {
        let block = 256;
        let frames = (seconds * SR as f64) as usize;
        let mut out = Vec::with_capacity(frames);
        let mut time = start;
        let dry = vec![dry_level; block];
        let wet = vec![0.0; block];
        let mut l = vec![0.0; block];
        let mut r = vec![0.0; block];
        for _ in 0..frames / block {
            mixer.process(&dry, &wet, time, &mut l, &mut r);
            out.extend_from_slice(&l);
            time += block as f64 / SR as f64;
        }
        (time, out)
    }

    #[test]
    fn quiet_signal_passes_without_duck() {
        let mut mixer = Mixer::live(&config(), SR);
        run(&mut mixer, 0.01, 1.0, 0.0);
        assert_eq!(mixer.duck_count(), 0);
        assert_eq!(mixer.master_at(1.0), 0.78);
    }

    #[test]
    fn loud_output_ducks_to_floor_and_stays() {
        let mut mixer = Mixer::live(&config(), SR);
        let (time, out) = run(&mut mixer, 4.0, 2.0, 0.0);
        assert!(mixer.duck_count() > 0);
        assert!(out.iter().all(|x| x.abs() <= 1.0));

        // Once the output drops below threshold the master stays where it
        // was left: no automatic recovery.
        let ducked = mixer.master_at(time);
        assert!(ducked < 0.78);
        assert!(ducked >= 0.15);
        run(&mut mixer, 0.0, 1.0, time);
        assert_eq!(mixer.master_at(time + 1.0), ducked);
    }

    #[test]
    fn duck_ramp_never_goes_below_floor() {
        let mut mixer = Mixer::live(&config(), SR);
        for i in 0..50 {
            mixer.duck(i as f64 * 0.05);
        }
        assert!((mixer.master_at(5.0) - 0.15).abs() < 1e-6);
    }

    #[test]
    fn panic_mutes_then_restores_once() {
        let mut mixer = Mixer::live(&config(), SR);
        mixer.panic(1.0);
        assert!(mixer.master_at(1.03) <= GAIN_FLOOR * 1.001);
        assert!(mixer.master_at(1.1) <= GAIN_FLOOR * 1.001);
        assert_eq!(mixer.master_at(1.12), 0.78);
        assert_eq!(mixer.master_at(10.0), 0.78);
        assert_eq!(mixer.restore_count(), 1);
    }

    #[test]
    fn ensure_audible_only_lifts_a_buried_master() {
        let mut mixer = Mixer::live(&config(), SR);
        mixer.ensure_audible(0.5);
        assert_eq!(mixer.master_at(0.5), 0.78);

        for i in 0..50 {
            mixer.duck(i as f64 * 0.05);
        }
        // Sitting exactly at the floor counts as audible.
        mixer.ensure_audible(5.0);
        assert!((mixer.master_at(5.0) - 0.15).abs() < 1e-6);

        mixer.panic(6.0);
        mixer.ensure_audible(6.05);
        assert_eq!(mixer.master_at(6.05), 0.78);
    }

    #[test]
    fn offline_master_uses_bounce_gain() {
        let mixer = Mixer::offline(&config(), SR);
        assert_eq!(mixer.master_at(0.0), 0.95);
    }

    #[test]
    fn reverb_return_follows_level() {
        let mut mixer = Mixer::live(&config(), SR);
        mixer.set_reverb_level(0.0);
        let dry = vec![0.0; 256];
        let wet = vec![0.5; 256];
        let mut l = vec![1.0; 256];
        let mut r = vec![1.0; 256];
        for block in 0..8 {
            mixer.process(&dry, &wet, block as f64 * 0.032, &mut l, &mut r);
            assert!(l.iter().chain(&r).all(|x| x.abs() < 1.0e-5));
        }
    }
}
