use rand::{rngs::StdRng, Rng, SeedableRng};

/// Pre-rendered noise burst with a linear fade-out: `(rand*2-1) * (1 - i/len)`.
///
/// Every burst comes from a seeded generator so a bounce renders exactly the
/// same transients as live playback did.
#[derive(Debug, Clone)]
pub struct NoiseBuffer {
    samples: Vec<f32>,
}

impl NoiseBuffer {
    pub fn faded(duration: f32, sample_rate: f32, seed: u64) -> Self {
        let len = ((duration * sample_rate).floor() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(seed);

        let samples = (0..len)
            .map(|i| {
                let fade = 1.0 - i as f32 / len as f32;
                (rng.gen::<f32>() * 2.0 - 1.0) * fade
            })
            .collect();

        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample `index` frames after the burst starts; silence outside it.
    #[inline]
    pub fn sample(&self, index: i64) -> f32 {
        if index < 0 {
            return 0.0;
        }
        self.samples.get(index as usize).copied().unwrap_or(0.0)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }
}

/// Derive a per-note seed so two notes in one chord get distinct bursts.
pub fn note_seed(frequency: f32, start: f64, salt: u64) -> u64 {
    let a = frequency.to_bits() as u64;
    let b = start.to_bits();
    a.rotate_left(17) ^ b ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15)
}
