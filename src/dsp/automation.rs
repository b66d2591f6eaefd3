/*
Automatable Parameter
=====================

A `Param` is a value that changes over time according to a list of scheduled
events. Every gain envelope, pitch sweep and master-level move in the engine
is a `Param`, so live playback and offline rendering share one timeline model.

Events:
-------
  set_value_at(t, v)         value jumps to v at t and holds
  linear_ramp_to(v, t)       straight line from the previous event to (t, v)
  exponential_ramp_to(v, t)  geometric curve from the previous event to (t, v)
  cancel_scheduled_values(t) drop every event at or after t

A ramp always starts from the value and time of the event before it, so

  set_value_at(0.0, 1e-4)
  exponential_ramp_to(0.9, 0.01)
  exponential_ramp_to(1e-4, 0.5)

is a 10 ms exponential attack followed by a long exponential decay.

Exponential ramps need both endpoints non-zero and of the same sign. Gains in
this crate therefore start from and decay to `GAIN_FLOOR` (1e-4, -80 dB)
instead of 0. A ramp that breaks that rule holds its start value, which is
what a host audio API does too.

Before the first event the parameter reports its default value. A ramp that
is the very first event starts from the default value at time 0.
*/

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Set,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Event {
    time: f64,
    value: f32,
    kind: Kind,
}

#[derive(Debug, Clone)]
pub struct Param {
    default: f32,
    events: Vec<Event>,
}

impl Param {
    pub fn new(default: f32) -> Self {
        Self {
            default,
            events: Vec::new(),
        }
    }

    pub fn set_value_at(&mut self, time: f64, value: f32) -> &mut Self {
        self.insert(Event {
            time,
            value,
            kind: Kind::Set,
        })
    }

    pub fn linear_ramp_to(&mut self, value: f32, end_time: f64) -> &mut Self {
        self.insert(Event {
            time: end_time,
            value,
            kind: Kind::Linear,
        })
    }

    pub fn exponential_ramp_to(&mut self, value: f32, end_time: f64) -> &mut Self {
        self.insert(Event {
            time: end_time,
            value,
            kind: Kind::Exponential,
        })
    }

    /// Remove every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) -> &mut Self {
        self.events.retain(|event| event.time < time);
        self
    }

    /// Freeze the curve at `time`: cancel what follows and pin the current
    /// value so later ramps start from where the sound actually is.
    pub fn hold_at(&mut self, time: f64) -> f32 {
        let current = self.value_at(time);
        self.cancel_scheduled_values(time);
        self.set_value_at(time, current);
        current
    }

    /// Fold every event up to `time` into one set event at `time`. The curve
    /// from `time` on is unchanged; long-lived params call this to stay small.
    pub fn compact(&mut self, time: f64) {
        let first_future = self.events.partition_point(|event| event.time <= time);
        if first_future <= 1 {
            return;
        }
        let current = self.value_at(time);
        self.events.drain(..first_future);
        self.events.insert(
            0,
            Event {
                time,
                value: current,
                kind: Kind::Set,
            },
        );
    }

    /// Time of the last scheduled event, if any.
    pub fn end_time(&self) -> Option<f64> {
        self.events.last().map(|event| event.time)
    }

    pub fn final_value(&self) -> f32 {
        self.events.last().map_or(self.default, |event| event.value)
    }

    pub fn value_at(&self, time: f64) -> f32 {
        // Index of the first event strictly after `time`.
        let next = self.events.partition_point(|event| event.time <= time);

        let (start_time, start_value) = match next.checked_sub(1) {
            Some(prev) => (self.events[prev].time, self.events[prev].value),
            None => (0.0, self.default),
        };

        let Some(target) = self.events.get(next) else {
            return start_value;
        };

        let span = target.time - start_time;
        if span <= 0.0 {
            return start_value;
        }
        let progress = ((time - start_time) / span).clamp(0.0, 1.0) as f32;

        match target.kind {
            Kind::Set => start_value,
            Kind::Linear => start_value + (target.value - start_value) * progress,
            Kind::Exponential => {
                if start_value == 0.0 || start_value.signum() != target.value.signum() {
                    start_value
                } else {
                    start_value * (target.value / start_value).powf(progress)
                }
            }
        }
    }

    /// Fill `out` with the curve sampled from `start` at `sample_rate`.
    pub fn render(&self, out: &mut [f32], start: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;

        // Fast path once the timeline has settled.
        if self.end_time().map_or(true, |end| end <= start) {
            out.fill(self.final_value());
            return;
        }

        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.value_at(start + i as f64 * dt);
        }
    }

    fn insert(&mut self, event: Event) -> &mut Self {
        // Events at the same instant keep insertion order.
        let index = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(index, event);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GAIN_FLOOR;

    #[test]
    fn reports_default_before_first_event() {
        let mut param = Param::new(0.5);
        param.set_value_at(1.0, 0.2);
        assert_eq!(param.value_at(0.5), 0.5);
        assert_eq!(param.value_at(1.0), 0.2);
        assert_eq!(param.value_at(3.0), 0.2);
    }

    #[test]
    fn linear_ramp_interpolates() {
        let mut param = Param::new(0.0);
        param.set_value_at(0.0, 0.0).linear_ramp_to(1.0, 1.0);
        assert!((param.value_at(0.25) - 0.25).abs() < 1e-6);
        assert!((param.value_at(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(param.value_at(2.0), 1.0);
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let mut param = Param::new(1.0);
        param.set_value_at(0.0, 1.0).exponential_ramp_to(0.01, 2.0);
        // Halfway in time is the geometric mean.
        assert!((param.value_at(1.0) - 0.1).abs() < 1e-4);
    }

    #[test]
    fn exponential_ramp_from_zero_holds() {
        let mut param = Param::new(0.0);
        param.set_value_at(0.0, 0.0).exponential_ramp_to(1.0, 1.0);
        assert_eq!(param.value_at(0.5), 0.0);
    }

    #[test]
    fn cancel_drops_pending_ramp() {
        let mut param = Param::new(GAIN_FLOOR);
        param
            .set_value_at(0.0, 1.0)
            .exponential_ramp_to(GAIN_FLOOR, 1.0);
        param.cancel_scheduled_values(0.5);
        // Ramp removed: value holds at the last surviving event.
        assert_eq!(param.value_at(0.75), 1.0);
    }

    #[test]
    fn hold_at_pins_current_value() {
        let mut param = Param::new(0.0);
        param.set_value_at(0.0, 0.0).linear_ramp_to(1.0, 1.0);
        let held = param.hold_at(0.5);
        assert!((held - 0.5).abs() < 1e-6);
        param.exponential_ramp_to(GAIN_FLOOR, 0.6);
        assert!((param.value_at(0.5) - 0.5).abs() < 1e-6);
        assert!(param.value_at(0.59) < 0.5);
        assert_eq!(param.value_at(0.7), GAIN_FLOOR);
    }

    #[test]
    fn compact_keeps_the_curve() {
        let mut param = Param::new(1.0);
        param
            .set_value_at(0.0, 1.0)
            .linear_ramp_to(0.5, 1.0)
            .set_value_at(1.5, 0.5)
            .exponential_ramp_to(0.05, 3.0);
        let before: Vec<f32> = (0..40).map(|i| param.value_at(2.0 + i as f64 * 0.05)).collect();

        param.compact(2.0);
        assert_eq!(param.events.len(), 2);
        let after: Vec<f32> = (0..40).map(|i| param.value_at(2.0 + i as f64 * 0.05)).collect();
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn render_matches_point_evaluation() {
        let mut param = Param::new(GAIN_FLOOR);
        param
            .set_value_at(0.0, GAIN_FLOOR)
            .exponential_ramp_to(0.9, 0.01);

        let sample_rate = 1_000.0;
        let mut out = vec![0.0; 20];
        param.render(&mut out, 0.0, sample_rate);

        for (i, &sample) in out.iter().enumerate() {
            let expected = param.value_at(i as f64 / 1_000.0);
            assert!((sample - expected).abs() < 1e-6, "sample {i} mismatch");
        }
        assert!((out[15] - 0.9).abs() < 1e-6);
    }
}
