use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| type      | passes           | rejects          | q means                 |
| --------- | ---------------- | ---------------- | ----------------------- |
| low-pass  | below cutoff     | above cutoff     | resonance peak, in dB   |
| high-pass | above cutoff     | below cutoff     | resonance peak, in dB   |
| band-pass | around center    | both sides       | bandwidth (linear Q)    |
| peaking   | everything       | nothing          | bandwidth of the bump   |

Coefficients follow the RBJ audio-EQ cookbook. Low/high-pass interpret Q in
decibels the way host audio APIs do, so a preset written as "Q 0.7" gets a
slight resonant bump rather than a Butterworth response.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    /// Bell boost/cut with gain in dB.
    Peaking { gain_db: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

/// Second-order IIR filter, transposed direct form II.
#[derive(Debug, Clone)]
pub struct Biquad {
    filter_type: FilterType,
    pub frequency: f32,
    pub q: f32,
    coefficients: Option<(f32, Coefficients)>,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(filter_type: FilterType, frequency: f32, q: f32) -> Self {
        Self {
            filter_type,
            frequency,
            q,
            coefficients: None,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn lowpass(frequency: f32, q: f32) -> Self {
        Self::new(FilterType::LowPass, frequency, q)
    }

    pub fn highpass(frequency: f32, q: f32) -> Self {
        Self::new(FilterType::HighPass, frequency, q)
    }

    pub fn bandpass(frequency: f32, q: f32) -> Self {
        Self::new(FilterType::BandPass, frequency, q)
    }

    pub fn peaking(frequency: f32, q: f32, gain_db: f32) -> Self {
        Self::new(FilterType::Peaking { gain_db }, frequency, q)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.coefficients = None;
    }

    pub fn set_q(&mut self, q: f32) {
        self.q = q;
        self.coefficients = None;
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    fn coefficients(&mut self, sample_rate: f32) -> Coefficients {
        match self.coefficients {
            Some((rate, coefficients)) if rate == sample_rate => coefficients,
            _ => {
                let coefficients = self.design(sample_rate);
                self.coefficients = Some((sample_rate, coefficients));
                coefficients
            }
        }
    }

    fn design(&self, sample_rate: f32) -> Coefficients {
        let nyquist = 0.5 * sample_rate;
        let frequency = self.frequency.clamp(1.0, nyquist * 0.999);
        let w0 = TAU * frequency / sample_rate;
        let (sin, cos) = w0.sin_cos();

        let (b0, b1, b2, a0, a1, a2) = match self.filter_type {
            FilterType::LowPass => {
                let alpha = sin / (2.0 * resonance_q(self.q));
                let b1 = 1.0 - cos;
                (b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cos, 1.0 - alpha)
            }
            FilterType::HighPass => {
                let alpha = sin / (2.0 * resonance_q(self.q));
                let b1 = -(1.0 + cos);
                (-b1 / 2.0, b1, -b1 / 2.0, 1.0 + alpha, -2.0 * cos, 1.0 - alpha)
            }
            FilterType::BandPass => {
                let alpha = sin / (2.0 * self.q.max(1.0e-4));
                (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos, 1.0 - alpha)
            }
            FilterType::Peaking { gain_db } => {
                let a = 10.0_f32.powf(gain_db / 40.0);
                let alpha = sin / (2.0 * self.q.max(1.0e-4));
                (
                    1.0 + alpha * a,
                    -2.0 * cos,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cos,
                    1.0 - alpha / a,
                )
            }
        };

        Coefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    #[inline]
    fn tick(&mut self, c: Coefficients, x: f32) -> f32 {
        let y = c.b0 * x + self.z1;
        self.z1 = c.b1 * x - c.a1 * y + self.z2;
        self.z2 = c.b2 * x - c.a2 * y;
        y
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, sample: f32, sample_rate: f32) -> f32 {
        let c = self.coefficients(sample_rate);
        self.tick(c, sample)
    }

    /// Filter a buffer in place.
    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let c = self.coefficients(sample_rate);
        for sample in buffer.iter_mut() {
            *sample = self.tick(c, *sample);
        }
        // Flush denormals once the input has gone quiet.
        if self.z1.abs() < 1.0e-20 {
            self.z1 = 0.0;
        }
        if self.z2.abs() < 1.0e-20 {
            self.z2 = 0.0;
        }
    }
}

#[inline]
fn resonance_q(q_db: f32) -> f32 {
    10.0_f32.powf(q_db / 20.0)
}
