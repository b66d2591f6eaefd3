/// Circular delay line with linearly interpolated fractional reads.
///
/// Feedback loops read first and write second: `read` returns the sample
/// written `delay` frames ago, then `write` pushes the new input.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Allocate room for up to `max_delay_samples` of delay.
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples.max(1) + 2],
            write_pos: 0,
        }
    }

    pub fn with_max_seconds(max_seconds: f32, sample_rate: f32) -> Self {
        Self::new((max_seconds * sample_rate).ceil() as usize)
    }

    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 2
    }

    /// Sample written `delay` frames before the next write, clamped to
    /// [1, max_delay].
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(1.0, self.max_delay() as f32);
        let whole = delay.floor() as usize;
        let frac = delay - whole as f32;

        let a = self.buffer[(self.write_pos + len - whole) % len];
        let b = self.buffer[(self.write_pos + len - whole - 1) % len];
        a + (b - a) * frac
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read at `delay`, then write `sample`. Convenience for feed-forward use.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, delay: f32) -> f32 {
        let delayed = self.read(delay);
        self.write(sample);
        delayed
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
