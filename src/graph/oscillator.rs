use crate::{
    dsp::{
        oscillator::{cents_to_ratio, Oscillator, Waveform},
        Param,
    },
    graph::node::{GraphNode, RenderCtx},
};

/*
Audio Oscillator
================

The pitched source of every chord voice. Each `OscNode` plays one partial:
a waveform at a frequency, scaled by a constant gain, optionally detuned and
optionally starting late. Envelopes and filters come after it in the graph.

Waveforms, from darkest to brightest:
-------------------------------------

  Sine      fundamental only            sub layers, upper partials
  Triangle  odd harmonics, 1/n^2        soft piano and pad partials
  Square    odd harmonics, 1/n          hollow, reedy
  Sawtooth  every harmonic, 1/n         bright synth, guitar body

Partial stacks:
---------------
An additive voice builds its timbre from several OscNodes at f, 2f, 3f...
with falling gains. Harmonic n of a 220 Hz note sits at n * 220 Hz, so a
six-partial stack reaches 1320 Hz before the lowpass shapes it further.

Frequency is a `Param`, so a drum can sweep its pitch with the same
exponential ramps the envelopes use.

Example usage:
  let osc = OscNode::sine(220.0);       // Pure tone
  let osc = OscNode::sawtooth(110.0);   // Rich and bright
  let osc = OscNode::triangle(440.0)    // Soft and mellow
      .with_detune(-4.0)
      .with_gain(0.22);

  // Kick drum body: 130 Hz sweeping down to 48 Hz over 90 ms
  let body = OscNode::sine(130.0).sweep_to(48.0, 0.09);

  // Third note of a strummed chord
  let late = OscNode::triangle(392.0).starting_at(2.0 * 0.018);
*/

pub struct OscNode {
    osc: Oscillator,
    /// Frequency in Hz over voice-local time.
    frequency: Param,
    /// Precomputed 2^(cents/1200).
    detune_ratio: f32,
    gain: f32,
    /// Voice-local instant the oscillator starts; silent before it.
    start: f64,
}

impl OscNode {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        let mut param = Param::new(frequency);
        param.set_value_at(0.0, frequency);
        Self {
            osc: Oscillator::new(waveform),
            frequency: param,
            detune_ratio: 1.0,
            gain: 1.0,
            start: 0.0,
        }
    }

    pub fn sine(frequency: f32) -> Self {
        Self::new(Waveform::Sine, frequency)
    }

    pub fn sawtooth(frequency: f32) -> Self {
        Self::new(Waveform::Sawtooth, frequency)
    }

    pub fn square(frequency: f32) -> Self {
        Self::new(Waveform::Square, frequency)
    }

    pub fn triangle(frequency: f32) -> Self {
        Self::new(Waveform::Triangle, frequency)
    }

    /// Set detune in cents (100 cents = 1 semitone).
    ///
    /// Partial stacks use a few cents per partial to widen the sound without
    /// audible beating.
    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune_ratio = cents_to_ratio(cents);
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Delay the oscillator's start (strummed chords).
    pub fn starting_at(mut self, start: f64) -> Self {
        self.start = start.max(0.0);
        self
    }

    /// Exponential pitch sweep from the current frequency to `frequency`,
    /// arriving at `end_time`.
    pub fn sweep_to(mut self, frequency: f32, end_time: f64) -> Self {
        self.frequency.exponential_ramp_to(frequency, end_time);
        self
    }

    pub fn frequency_at(&self, time: f64) -> f32 {
        self.frequency.value_at(time)
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let settled = self
            .frequency
            .end_time()
            .map_or(true, |end| end <= ctx.time);
        let fixed = self.frequency.final_value() * self.detune_ratio;

        for (i, sample) in out.iter_mut().enumerate() {
            let t = ctx.time_at(i);
            if t < self.start {
                *sample = 0.0;
                continue;
            }
            let frequency = if settled {
                fixed
            } else {
                self.frequency.value_at(t) * self.detune_ratio
            };
            *sample = self.osc.next_sample(frequency, ctx.sample_rate) * self.gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000.0;
        let ctx = RenderCtx::new(sample_rate, 0.0);
        let mut synth = OscNode::sine(440.0);
        let mut buffer = vec![0.0f32; 128];

        synth.render_block(&mut buffer, &ctx);

        // sample n should be sin(2pi f n / sr)
        let sample_index = 12;
        let expected = (TAU * 440.0 * sample_index as f32 / sample_rate).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn delayed_start_is_silent_until_start() {
        let sample_rate = 1_000.0;
        let mut osc = OscNode::sawtooth(100.0).starting_at(0.036);
        let mut buffer = vec![0.0f32; 64];
        osc.render_block(&mut buffer, &RenderCtx::new(sample_rate, 0.0));

        assert!(buffer[..36].iter().all(|&x| x == 0.0));
        assert!(buffer[36..].iter().any(|&x| x != 0.0));
    }

    #[test]
    fn sweep_reaches_target() {
        let osc = OscNode::sine(130.0).sweep_to(48.0, 0.09);
        assert!((osc.frequency_at(0.0) - 130.0).abs() < 1e-3);
        assert!((osc.frequency_at(0.09) - 48.0).abs() < 1e-3);
        let mid = osc.frequency_at(0.045);
        assert!((mid - (130.0f32 * 48.0).sqrt()).abs() < 0.1);
    }

    #[test]
    fn gain_scales_output() {
        let ctx = RenderCtx::new(48_000.0, 0.0);
        let mut loud = OscNode::sine(440.0);
        let mut quiet = OscNode::sine(440.0).with_gain(0.25);
        let mut a = vec![0.0f32; 64];
        let mut b = vec![0.0f32; 64];
        loud.render_block(&mut a, &ctx);
        quiet.render_block(&mut b, &ctx);
        for (x, y) in a.iter().zip(&b) {
            assert!((x * 0.25 - y).abs() < 1e-6);
        }
    }

    #[test]
    fn oscillators_never_keep_a_voice_alive() {
        assert!(!OscNode::sine(440.0).is_active());
    }
}
