use crate::{
    dsp::Param,
    graph::node::{GraphNode, Release, RenderCtx, VoiceState},
    GAIN_FLOOR,
};

/*
Envelope Node
=============

An envelope is a gain curve over the life of a voice, rendered as a signal
and multiplied into the sound with `.amplify()`. It is built on `Param`, so
every segment is a scheduled ramp rather than a per-sample state machine.

Shapes:
-------

ADSR (sustaining voices):

  level
   peak ┤   /\
        │  /  \______________   sustain
        │ /                  \
  floor ┤/                    \____
        └──┬───┬─────────────┬────┬──→ time
          atk  decay        rel  end

  floor → peak (exponential, attack) → sustain (exponential, decay) → hold
  until released → floor (exponential, release).

Breakpoints (one-shots):

  Explicit points after the floor at t = 0, e.g. a clap:
    exp 0.85 @3 ms, set 0.35 @20 ms, set 0.60 @32 ms, exp floor @110 ms
  There is no sustain; the voice is silent after the last point.

Release:
--------

Releasing at `t` pins the current value (so there is no jump back to an
earlier level) and ramps to the floor over the release time. A fast release
(stop, panic) caps that time. A release that would end later than one
already in progress is ignored, so a forced stop never lengthens a voice.

Everything starts from and decays to `GAIN_FLOOR`, never zero, because an
exponential ramp cannot start or end at 0.

Example usage:
  // Chord tone held for 0.5 s, then a 0.75 s release
  let voice = OscNode::triangle(220.0)
      .amplify(EnvNode::adsr(0.004, 0.22, 0.9, 0.38, 0.75).release_after(0.5));

  // Hi-hat
  let hat = NoiseNode::new(noise)
      .through(FilterNode::new(Biquad::highpass(7000.0, 0.0)))
      .amplify(EnvNode::breakpoints(&[
          Breakpoint::Exp(0.002, 0.55),
          Breakpoint::Exp(0.045, GAIN_FLOOR),
      ]));
*/

/// Minimum level targeted by attack and decay ramps.
const MIN_LEVEL: f32 = 2.0 * GAIN_FLOOR;

/// Release used by one-shot envelopes when stopped without an explicit fade.
const ONE_SHOT_RELEASE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Breakpoint {
    /// Jump to the value at the time.
    Set(f64, f32),
    /// Exponential ramp ending at the time.
    Exp(f64, f32),
    /// Linear ramp ending at the time.
    Linear(f64, f32),
}

impl Breakpoint {
    fn time(self) -> f64 {
        match self {
            Breakpoint::Set(t, _) | Breakpoint::Exp(t, _) | Breakpoint::Linear(t, _) => t,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvNode {
    gain: Param,
    attack_end: f64,
    decay_end: f64,
    sustains: bool,
    release: f64,
    release_start: f64,
    end: f64,
    time: f64,
}

impl EnvNode {
    /// Floor → `peak` over `attack` → `sustain` over `decay`, then hold until
    /// released. Levels are absolute (already scaled by velocity).
    pub fn adsr(attack: f64, decay: f64, peak: f32, sustain: f32, release: f64) -> Self {
        let attack = attack.max(0.0);
        let decay_end = attack + decay.max(0.0);
        let mut gain = Param::new(GAIN_FLOOR);
        gain.set_value_at(0.0, GAIN_FLOOR)
            .exponential_ramp_to(peak.max(MIN_LEVEL), attack)
            .exponential_ramp_to(sustain.max(MIN_LEVEL), decay_end);

        Self {
            gain,
            attack_end: attack,
            decay_end,
            sustains: true,
            release: release.max(0.0),
            release_start: f64::INFINITY,
            end: f64::INFINITY,
            time: 0.0,
        }
    }

    /// Floor → `level` over `attack`, then hold until released.
    pub fn attack_hold(attack: f64, level: f32, release: f64) -> Self {
        Self::adsr(attack, 0.0, level, level, release)
    }

    /// One-shot curve through explicit points after the floor at t = 0.
    pub fn breakpoints(points: &[Breakpoint]) -> Self {
        let mut gain = Param::new(GAIN_FLOOR);
        gain.set_value_at(0.0, GAIN_FLOOR);
        for &point in points {
            match point {
                Breakpoint::Set(t, v) => gain.set_value_at(t, v),
                Breakpoint::Exp(t, v) => gain.exponential_ramp_to(v, t),
                Breakpoint::Linear(t, v) => gain.linear_ramp_to(v, t),
            };
        }
        let attack_end = points.first().map_or(0.0, |p| p.time());
        let end = points.iter().map(|p| p.time()).fold(0.0, f64::max);

        Self {
            gain,
            attack_end,
            decay_end: end,
            sustains: false,
            release: ONE_SHOT_RELEASE,
            release_start: end,
            end,
            time: 0.0,
        }
    }

    /// Schedule the natural release `length` seconds after the start.
    pub fn release_after(mut self, length: f64) -> Self {
        let release = self.release;
        self.release_at(length.max(0.0), release);
        self
    }

    /// Instant the voice goes silent, or infinity while held.
    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn release_start(&self) -> f64 {
        self.release_start
    }

    pub fn value_at(&self, time: f64) -> f32 {
        self.gain.value_at(time)
    }

    pub fn stage_at(&self, time: f64) -> VoiceState {
        if time >= self.end {
            VoiceState::Silent
        } else if time < self.attack_end {
            VoiceState::Attack
        } else if time < self.decay_end {
            VoiceState::Decay
        } else if self.sustains && time < self.release_start {
            VoiceState::Sustain
        } else if self.sustains {
            VoiceState::Release
        } else {
            VoiceState::Decay
        }
    }

    fn release_at(&mut self, at: f64, duration: f64) {
        let current = self.gain.hold_at(at);
        if current < GAIN_FLOOR {
            self.gain.set_value_at(at, GAIN_FLOOR);
        }
        self.gain.exponential_ramp_to(GAIN_FLOOR, at + duration);
        self.release_start = self.release_start.min(at);
        self.end = at + duration;
        // A release inside the attack or decay cuts those phases short.
        self.attack_end = self.attack_end.min(at);
        self.decay_end = self.decay_end.min(at);
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.gain.render(out, ctx.time, ctx.sample_rate);
        self.time = ctx.time_at(out.len());
    }

    fn note_off(&mut self, release: &Release) {
        let at = release.at.max(0.0);
        let duration = release
            .fade
            .map_or(self.release, |fade| fade.min(self.release).max(0.0));
        if at >= self.end || (at >= self.release_start && self.end <= at + duration) {
            return;
        }
        self.release_at(at, duration);
    }

    fn stage(&self) -> Option<VoiceState> {
        Some(self.stage_at(self.time))
    }

    fn is_active(&self) -> bool {
        self.time < self.end
    }
}
