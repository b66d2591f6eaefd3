use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/*
Convolution Reverb
==================

The reverb convolves the wet bus with a synthetic stereo impulse response:
white noise shaped by (1 - t)^decay over a fixed length. The same seeded
impulse is built for live playback and for the bounce.

Uniformly Partitioned Overlap-Save
----------------------------------

A 1.8 s impulse at 44.1 kHz is ~80k taps; direct convolution would cost 80k
multiply-adds per sample. Instead the impulse is cut into P partitions of B
samples, each pre-transformed with an FFT of size 2B:

  input blocks:   ... [x(k-1)] [x(k)]
  spectrum:       X(k) = FFT([x(k-1), x(k)])
  output block:   y(k) = last B samples of IFFT( sum_p X(k-p) * H(p) )

The X(k-p) spectra live in a ring (the frequency-domain delay line), so
each block costs one forward FFT, P complex multiply-adds per bin, and one
inverse FFT per output channel. The price is B samples of latency.

Normalization
-------------

Like a host convolver, the impulse is scaled so its RMS power lands at a
fixed calibration level independent of its length:

  power = sqrt(sum(ir^2) / (channels * len))     (floor 0.000125)
  scale = (1 / power) * 0.00125 * (44100 / sample_rate)
*/

/// Partition size; also the reverb latency in samples.
pub const BLOCK_SIZE: usize = 512;

const MIN_POWER: f32 = 0.000125;
const GAIN_CALIBRATION: f32 = 0.00125;
const CALIBRATION_RATE: f32 = 44_100.0;

/// Stereo decaying-noise impulse response: `(rand*2-1) * (1 - i/len)^decay`.
pub fn impulse_response(sample_rate: f32, seconds: f32, decay: f32, seed: u64) -> [Vec<f32>; 2] {
    let len = ((sample_rate * seconds) as usize).max(1);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut channel = || -> Vec<f32> {
        (0..len)
            .map(|i| {
                let envelope = (1.0 - i as f32 / len as f32).powf(decay);
                (rng.gen::<f32>() * 2.0 - 1.0) * envelope
            })
            .collect()
    };

    let left = channel();
    let right = channel();
    [left, right]
}

/// Scale a host convolver applies to an impulse response before use.
pub fn normalization_scale(channels: &[Vec<f32>], sample_rate: f32) -> f32 {
    let len = channels.first().map_or(0, Vec::len);
    if len == 0 {
        return 1.0;
    }
    let energy: f32 = channels
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|x| x * x)
        .sum();

    let mut power = (energy / (channels.len() * len) as f32).sqrt();
    if !power.is_finite() || power < MIN_POWER {
        power = MIN_POWER;
    }

    (1.0 / power) * GAIN_CALIBRATION * (CALIBRATION_RATE / sample_rate)
}

/// Mono-in, stereo-out partitioned FFT convolver.
pub struct Convolver {
    block: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Per output channel, one spectrum per impulse partition.
    partitions: [Vec<Vec<Complex<f32>>>; 2],
    /// Ring of past input spectra, newest at `fdl_pos`.
    fdl: Vec<Vec<Complex<f32>>>,
    fdl_pos: usize,
    window: Vec<f32>,
    fill: usize,
    spectrum: Vec<Complex<f32>>,
    accum: Vec<Complex<f32>>,
    output: [Vec<f32>; 2],
}

impl Convolver {
    /// Build from a stereo impulse response. The impulse is normalized the
    /// way a host convolver does.
    pub fn new(impulse: [Vec<f32>; 2], sample_rate: f32) -> Self {
        Self::with_block_size(impulse, sample_rate, BLOCK_SIZE)
    }

    pub fn with_block_size(impulse: [Vec<f32>; 2], sample_rate: f32, block: usize) -> Self {
        let block = block.max(1);
        let size = block * 2;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        let mut scratch = vec![Complex::default(); scratch_len];

        let scale = normalization_scale(&impulse, sample_rate);
        let count = impulse
            .iter()
            .map(|channel| channel.len().div_ceil(block))
            .max()
            .unwrap_or(0)
            .max(1);

        let partitions = impulse.map(|channel| {
            (0..count)
                .map(|p| {
                    let mut spectrum = vec![Complex::default(); size];
                    let start = (p * block).min(channel.len());
                    let end = ((p + 1) * block).min(channel.len());
                    for (bin, &tap) in spectrum.iter_mut().zip(&channel[start..end]) {
                        bin.re = tap * scale;
                    }
                    fft.process_with_scratch(&mut spectrum, &mut scratch);
                    spectrum
                })
                .collect::<Vec<_>>()
        });

        Self {
            block,
            fft,
            ifft,
            scratch,
            partitions,
            fdl: vec![vec![Complex::default(); size]; count],
            fdl_pos: 0,
            window: vec![0.0; size],
            fill: 0,
            spectrum: vec![Complex::default(); size],
            accum: vec![Complex::default(); size],
            output: [vec![0.0; block], vec![0.0; block]],
        }
    }

    /// Latency in samples between input and the first output tap.
    pub fn latency(&self) -> usize {
        self.block
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let out = (self.output[0][self.fill], self.output[1][self.fill]);
        self.window[self.block + self.fill] = input;
        self.fill += 1;
        if self.fill == self.block {
            self.run_block();
            self.fill = 0;
        }
        out
    }

    fn run_block(&mut self) {
        let size = self.block * 2;
        let count = self.fdl.len();

        for (bin, &x) in self.spectrum.iter_mut().zip(&self.window) {
            *bin = Complex::new(x, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);
        self.fdl[self.fdl_pos].copy_from_slice(&self.spectrum);

        let norm = 1.0 / size as f32;
        for (channel, partitions) in self.partitions.iter().enumerate() {
            self.accum.fill(Complex::default());
            for (p, h) in partitions.iter().enumerate() {
                let x = &self.fdl[(self.fdl_pos + count - p) % count];
                for ((acc, &xb), &hb) in self.accum.iter_mut().zip(x).zip(h) {
                    *acc += xb * hb;
                }
            }
            self.ifft
                .process_with_scratch(&mut self.accum, &mut self.scratch);
            for (out, bin) in self.output[channel]
                .iter_mut()
                .zip(&self.accum[self.block..])
            {
                *out = bin.re * norm;
            }
        }

        self.fdl_pos = (self.fdl_pos + 1) % count;
        self.window.copy_within(self.block..size, 0);
    }

    pub fn reset(&mut self) {
        for spectrum in &mut self.fdl {
            spectrum.fill(Complex::default());
        }
        self.window.fill(0.0);
        self.output.iter_mut().for_each(|channel| channel.fill(0.0));
        self.fill = 0;
        self.fdl_pos = 0;
    }
}
