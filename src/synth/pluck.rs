use crate::{
    dsp::{
        delay::DelayLine,
        filter::Biquad,
        noise::{note_seed, NoiseBuffer},
    },
    graph::{
        envelope::{Breakpoint, EnvNode},
        extensions::NodeExt,
        filter::FilterNode,
        noise::NoiseNode,
        GraphNode, Release, RenderCtx, VoiceState,
    },
    preset::PluckParams,
    GAIN_FLOOR, MAX_BLOCK_SIZE,
};

/*
Plucked String (Karplus-Strong)
===============================

A short noise burst excites a delay line one period long. Every pass
through the loop filters and attenuates the burst, so it settles into a
decaying tone at the loop frequency.

  noise (28 ms) → lowpass (800 + 4200·b) → exciter gain ──┐
                                                          ▼
                     ┌──────────── feedback × fb ───── (+) ──→ delay (1/f)
                     │                                           │
                     └── highpass 60 Hz ←── lowpass (1200 + 2600·b) ←┘
                                 │
                                 └──→ output gain → sends

  b  = brightness, fb = clamp(0.92 - 0.25·damp + 0.02·decay, 0.65, 0.93)

The loop lowpass takes more off the top each period, which is what makes
the high harmonics die first. The highpass keeps DC from building up in
the loop. Feedback never reaches 1, so every pluck dies out on its own;
the output envelope only trims the tail.
*/

const EXCITER_SECONDS: f32 = 0.028;
const MIN_FREQUENCY: f32 = 40.0;
const OUTPUT_ATTACK: f64 = 0.008;
const OUTPUT_LEVEL: f32 = 0.65;
const OUTPUT_TAIL: f64 = 0.02;

/// Loop gain per period for a preset.
pub fn pluck_feedback(params: &PluckParams) -> f32 {
    (0.92 - 0.25 * params.damp + 0.02 * params.decay).clamp(0.65, 0.93)
}

/// Delay loop driven by an exciter node.
pub struct KarplusNode<E> {
    exciter: E,
    delay: DelayLine,
    frequency: f32,
    feedback: f32,
    loop_lowpass: Biquad,
    loop_highpass: Biquad,
    excitation: Vec<f32>,
}

impl<E: GraphNode> KarplusNode<E> {
    pub fn new(
        exciter: E,
        frequency: f32,
        brightness: f32,
        feedback: f32,
        sample_rate: f32,
    ) -> Self {
        let frequency = frequency.max(MIN_FREQUENCY);
        Self {
            exciter,
            delay: DelayLine::new((sample_rate / frequency).ceil() as usize + 2),
            frequency,
            feedback,
            loop_lowpass: Biquad::lowpass(1200.0 + 2600.0 * brightness, 0.6),
            loop_highpass: Biquad::highpass(60.0, 0.7),
            excitation: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }
}

impl<E: GraphNode> GraphNode for KarplusNode<E> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let period = ctx.sample_rate / self.frequency;

        let excitation = &mut self.excitation[..out.len()];
        excitation.fill(0.0);
        self.exciter.render_block(excitation, ctx);

        for (sample, &excite) in out.iter_mut().zip(excitation.iter()) {
            let delayed = self.delay.read(period);
            let filtered = self.loop_lowpass.process(delayed, ctx.sample_rate);
            let y = self.loop_highpass.process(filtered, ctx.sample_rate);
            self.delay.write(excite + self.feedback * y);
            *sample = y;
        }
    }

    fn note_off(&mut self, release: &Release) {
        self.exciter.note_off(release);
    }

    fn stage(&self) -> Option<VoiceState> {
        self.exciter.stage()
    }

    fn is_active(&self) -> bool {
        self.exciter.is_active()
    }
}

/// Build one plucked note. With a `length` the output fades to the floor
/// 20 ms after it; without, the output holds until released.
pub fn note(
    params: &PluckParams,
    frequency: f32,
    length: Option<f64>,
    velocity: f32,
    sample_rate: f32,
    seed: u64,
) -> Box<dyn GraphNode> {
    let velocity = velocity.clamp(0.0, 1.0);
    let noise = NoiseBuffer::faded(EXCITER_SECONDS, sample_rate, note_seed(frequency, 0.0, seed));

    let exciter = NoiseNode::new(noise)
        .through(FilterNode::lowpass(800.0 + 4200.0 * params.brightness, 1.0))
        .amplify(EnvNode::breakpoints(&[
            Breakpoint::Exp(0.003, 0.9 * velocity),
            Breakpoint::Exp(0.03, GAIN_FLOOR),
        ]));

    let string = KarplusNode::new(
        exciter,
        frequency,
        params.brightness,
        pluck_feedback(params),
        sample_rate,
    );

    let level = OUTPUT_LEVEL * velocity;
    let output = match length {
        Some(length) => EnvNode::breakpoints(&[
            Breakpoint::Exp(OUTPUT_ATTACK, level),
            Breakpoint::Exp(length.max(OUTPUT_ATTACK) + OUTPUT_TAIL, GAIN_FLOOR),
        ]),
        None => EnvNode::attack_hold(OUTPUT_ATTACK, level, OUTPUT_TAIL),
    };

    string.amplify(output).boxed()
}
