//! Output analysis taps: RMS level meter and log-binned spectrum.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Number of log-spaced spectrum bins reported.
pub const SPECTRUM_BINS: usize = 48;

/// Sliding-window RMS meter over the most recent `window` samples.
#[derive(Debug, Clone)]
pub struct LevelMeter {
    ring: Vec<f32>,
    pos: usize,
}

impl LevelMeter {
    pub fn new(window: usize) -> Self {
        Self {
            ring: vec![0.0; window.max(1)],
            pos: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.ring[self.pos] = sample;
        self.pos = (self.pos + 1) % self.ring.len();
    }

    pub fn rms(&self) -> f32 {
        let energy: f32 = self.ring.iter().map(|x| x * x).sum();
        (energy / self.ring.len() as f32).sqrt()
    }

    /// RMS in dBFS, floored at -120.
    pub fn db(&self) -> f32 {
        let rms = self.rms();
        if rms <= 1.0e-6 {
            -120.0
        } else {
            20.0 * rms.log10()
        }
    }

    /// Copy the window oldest-first into `out` (which must match its length).
    pub fn snapshot(&self, out: &mut [f32]) {
        if out.len() != self.ring.len() {
            return;
        }
        let (newest, oldest) = self.ring.split_at(self.pos);
        out[..oldest.len()].copy_from_slice(oldest);
        out[oldest.len()..].copy_from_slice(newest);
    }

    pub fn window(&self) -> usize {
        self.ring.len()
    }

    pub fn reset(&mut self) {
        self.ring.fill(0.0);
        self.pos = 0;
    }
}

/// FFT spectrum with a Hann window, log-spaced bins from 20 Hz to Nyquist,
/// and exponential smoothing between frames.
pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    freq_bins: Vec<f64>,
    bin_indices: Vec<usize>,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
    smoothing: f32,
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, sample_rate: f32, smoothing: f32) -> Self {
        let fft_size = fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let denom = (fft_size - 1) as f32;
        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let max_freq = (sample_rate / 2.0).min(20_000.0).max(21.0) as f64;
        let min_freq = 20.0f64;
        let ratio = max_freq / min_freq;
        let half = fft_size / 2;

        let mut freq_bins = Vec::with_capacity(SPECTRUM_BINS);
        let mut bin_indices = Vec::with_capacity(SPECTRUM_BINS);
        for i in 0..SPECTRUM_BINS {
            let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
            let freq = min_freq * ratio.powf(t);
            let index = ((freq * fft_size as f64 / sample_rate as f64).round() as usize)
                .min(half - 1);
            freq_bins.push(freq);
            bin_indices.push(index);
        }

        let spectrum = freq_bins.iter().map(|&f| (f, -120.0)).collect();

        Self {
            window,
            freq_bins,
            bin_indices,
            fft,
            buffer: vec![Complex::default(); fft_size],
            magnitudes: vec![0.0; half],
            smoothing: smoothing.clamp(0.0, 0.999),
            spectrum,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    /// Analyze `samples`, which must hold exactly `fft_size` samples.
    pub fn update(&mut self, samples: &[f32]) {
        if samples.len() != self.window.len() {
            return;
        }

        for ((bin, &x), &w) in self.buffer.iter_mut().zip(samples).zip(&self.window) {
            *bin = Complex::new(x * w, 0.0);
        }
        self.fft.process(&mut self.buffer);

        let norm = 1.0 / self.window.len() as f32;
        for (magnitude, bin) in self.magnitudes.iter_mut().zip(&self.buffer) {
            let current = bin.norm() * norm;
            *magnitude = self.smoothing * *magnitude + (1.0 - self.smoothing) * current;
        }

        for (i, &index) in self.bin_indices.iter().enumerate() {
            let magnitude = self.magnitudes[index].max(1.0e-6);
            self.spectrum[i] = (self.freq_bins[i], 20.0 * (magnitude as f64).log10());
        }
    }

    /// `(frequency_hz, magnitude_db)` pairs, low to high.
    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::{Oscillator, Waveform};

    #[test]
    fn full_scale_sine_reads_minus_three_db() {
        let mut meter = LevelMeter::new(1_024);
        let mut osc = Oscillator::new(Waveform::Sine);
        for _ in 0..4_096 {
            meter.push(osc.next_sample(1_000.0, 48_000.0));
        }
        assert!((meter.db() + 3.01).abs() < 0.1, "got {}", meter.db());
    }

    #[test]
    fn silence_reads_floor() {
        let meter = LevelMeter::new(256);
        assert_eq!(meter.db(), -120.0);
    }

    #[test]
    fn snapshot_is_oldest_first() {
        let mut meter = LevelMeter::new(4);
        for x in 1..=6 {
            meter.push(x as f32);
        }
        let mut out = [0.0; 4];
        meter.snapshot(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn spectrum_peaks_near_tone() {
        let sample_rate = 48_000.0;
        let mut analyzer = SpectrumAnalyzer::new(2_048, sample_rate, 0.0);
        let mut osc = Oscillator::new(Waveform::Sine);
        let samples: Vec<f32> = (0..2_048)
            .map(|_| osc.next_sample(1_000.0, sample_rate))
            .collect();
        analyzer.update(&samples);

        let (peak_freq, _) = analyzer
            .data()
            .iter()
            .copied()
            .fold((0.0, f64::MIN), |best, bin| if bin.1 > best.1 { bin } else { best });
        assert!(
            (700.0..1_400.0).contains(&peak_freq),
            "peak at {peak_freq} Hz"
        );
    }
}
