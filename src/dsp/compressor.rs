/*
Soft-Knee Compressor
====================

Static curve (all values in dB, T = threshold, W = knee width, R = ratio):

  x < T - W/2            y = x
  |x - T| <= W/2         y = x + (1/R - 1) * (x - T + W/2)^2 / (2W)
  x > T + W/2            y = T + (x - T) / R

The detector is stereo-linked (peak of both channels). Gain reduction is
smoothed in the dB domain with separate attack and release time constants,
then makeup gain restores the level a full-scale input would have lost, at
the 0.6 power the host dynamics processor uses.
*/

use crate::config::CompressorConfig;

#[derive(Debug, Clone)]
pub struct Compressor {
    config: CompressorConfig,
    attack_coeff: f32,
    release_coeff: f32,
    makeup: f32,
    reduction_db: f32,
}

impl Compressor {
    pub fn new(config: CompressorConfig, sample_rate: f32) -> Self {
        let coeff = |seconds: f32| {
            if seconds <= 0.0 {
                0.0
            } else {
                (-1.0 / (seconds * sample_rate)).exp()
            }
        };
        let full_scale_reduction = static_reduction_db(&config, 0.0);

        Self {
            attack_coeff: coeff(config.attack_seconds),
            release_coeff: coeff(config.release_seconds),
            makeup: db_to_gain(-0.6 * full_scale_reduction),
            reduction_db: 0.0,
            config,
        }
    }

    /// Current smoothed gain reduction in dB (<= 0).
    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let level = left.abs().max(right.abs());
        let target = if level > 1.0e-6 {
            static_reduction_db(&self.config, gain_to_db(level))
        } else {
            0.0
        };

        // More reduction = attack, less = release.
        let coeff = if target < self.reduction_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.reduction_db = target + (self.reduction_db - target) * coeff;

        let gain = db_to_gain(self.reduction_db) * self.makeup;
        (left * gain, right * gain)
    }

    pub fn reset(&mut self) {
        self.reduction_db = 0.0;
    }
}

/// Gain change in dB the static curve applies at `input_db`.
pub fn static_reduction_db(config: &CompressorConfig, input_db: f32) -> f32 {
    let threshold = config.threshold_db;
    let knee = config.knee_db;
    let slope = 1.0 / config.ratio.max(1.0) - 1.0;
    let over = input_db - threshold;

    if knee > 0.0 && over.abs() <= knee * 0.5 {
        slope * (over + knee * 0.5).powi(2) / (2.0 * knee)
    } else if over > 0.0 {
        slope * over
    } else {
        0.0
    }
}

#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.max(1.0e-12).log10()
}

#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}
