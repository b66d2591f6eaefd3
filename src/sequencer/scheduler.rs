//! Look-ahead loop scheduler.
//!
//! Called on every control tick. For each event it works out the next
//! absolute beat the event sounds at; when that instant falls inside the
//! look-ahead window it is dispatched with its exact engine time, and the
//! absolute beat is remembered in the track's guard table so the same
//! occurrence is never dispatched twice.
//!
//! ```text
//!   absolute beats ──┬──────────────┬──────────────┬──────────────┬──→
//!                    0              lb             2lb            3lb
//!                          now ─┐
//!                               ├── look-ahead ──┤
//!                                      ▲ next = base + offset (this cycle)
//!                                        or + lb if already behind now
//! ```
//!
//! As long as consecutive ticks are less than the look-ahead apart, every
//! occurrence passes through the window at least once, and the guard keeps
//! it to exactly once.

use tracing::warn;

use super::{
    store::EventStore,
    track::{Event, EventId, Role, Track, TrackId},
    transport::Transport,
};
use crate::{
    config::SchedulerConfig,
    synth::{chord_voice, drum_voice, ChordRequest, Sends, SynthCtx, Voice},
    theory::{chord_for_pad, Key},
    voices::DrumKind,
    Result,
};

/// One occurrence ready to be voiced.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub track: TrackId,
    pub event: EventId,
    /// Absolute beat of the occurrence (the guard value).
    pub beat: f64,
    /// Engine time it sounds at.
    pub at: f64,
}

/// Next absolute beat at or after `now_beat` (within `epsilon`) that an
/// event at `offset` sounds in a loop of `loop_beats`.
pub fn next_occurrence(offset: f64, loop_beats: f64, now_beat: f64, epsilon: f64) -> f64 {
    let in_loop = offset.rem_euclid(loop_beats);
    let base = (now_beat / loop_beats).floor() * loop_beats;
    let next = base + in_loop;
    if next < now_beat - epsilon {
        next + loop_beats
    } else {
        next
    }
}

#[derive(Debug, Clone)]
pub struct LoopScheduler {
    config: SchedulerConfig,
}

impl LoopScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Collect the occurrences due within the look-ahead of `now` into
    /// `out`, marking each as dispatched.
    ///
    /// Muted tracks, mic tracks and the armed track while recording are
    /// skipped. Does nothing unless the transport is playing.
    pub fn poll(
        &self,
        transport: &Transport,
        store: &mut EventStore,
        now: f64,
        out: &mut Vec<Dispatch>,
    ) {
        if !transport.is_playing() {
            return;
        }
        let loop_beats = transport.loop_beats();
        let now_beat = transport.beat_at(now);
        let lookahead = transport.seconds_to_beats(self.config.lookahead_seconds);
        let bps = transport.beats_per_second();
        let recording = transport.is_recording();
        let armed = store.armed();

        for track in store.tracks_mut() {
            if track.muted || track.role() == Role::Mic {
                continue;
            }
            let track_id = track.id();
            if recording && armed == Some(track_id) {
                continue;
            }

            let Track {
                events,
                last_scheduled,
                ..
            } = track;
            for event in events.iter() {
                let next = next_occurrence(
                    event.offset(),
                    loop_beats,
                    now_beat,
                    self.config.epsilon_beats,
                );
                let delta = next - now_beat;
                if delta > lookahead || last_scheduled.get(&event.id()) == Some(&next) {
                    continue;
                }
                last_scheduled.insert(event.id(), next);
                out.push(Dispatch {
                    track: track_id,
                    event: event.id(),
                    beat: next,
                    at: now + delta / bps,
                });
            }
        }
    }
}

/// Build the voice for one dispatched occurrence of `event` on `track`.
///
/// Drum tracks map the pad onto the kit; every other role plays the chord
/// for the pad in `key`, thinned to the role's notes and held for the
/// event's duration.
pub fn voice_for(
    track: &Track,
    event: &Event,
    at: f64,
    transport: &Transport,
    key: Key,
    ctx: &SynthCtx,
) -> Result<Voice> {
    let seed = event.id().get();
    if track.role() == Role::Drums {
        return Ok(drum_voice(
            DrumKind::from_index(event.pad()),
            at,
            track.volume(),
            track.reverb_send(),
            seed,
            ctx,
        ));
    }

    let chord = chord_for_pad(event.pad(), key)?;
    let frequencies = track.role().frequencies(&chord);
    let request = ChordRequest {
        frequencies: &frequencies,
        start: at,
        length: Some(transport.beats_to_seconds(event.duration())),
        velocity: track.volume(),
        sends: Sends::new(1.0, track.reverb_send()),
        strum: track.strum(),
        seed,
    };
    Ok(chord_voice(&track.instrument().preset(), &request, ctx))
}

/// Voice a batch of dispatches, logging and skipping any that fail.
pub fn voices_for(
    dispatches: &[Dispatch],
    store: &EventStore,
    transport: &Transport,
    key: Key,
    ctx: &SynthCtx,
) -> Vec<Voice> {
    dispatches
        .iter()
        .filter_map(|d| {
            let track = store.track(d.track).ok()?;
            let event = track.event(d.event)?;
            match voice_for(track, event, d.at, transport, key, ctx) {
                Ok(voice) => Some(voice),
                Err(err) => {
                    warn!(track = %d.track, event = %d.event, %err, "dropped scheduled event");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::Instrument;

    fn setup(bars: u32) -> (Transport, EventStore, TrackId) {
        let mut transport = Transport::new(120.0, bars).unwrap();
        transport.start(0.0);
        let mut store = EventStore::new();
        let track = store.add_track(None);
        (transport, store, track)
    }

    #[test]
    fn next_occurrence_wraps_past_events() {
        assert_eq!(next_occurrence(1.0, 4.0, 0.5, 1e-4), 1.0);
        assert_eq!(next_occurrence(1.0, 4.0, 1.5, 1e-4), 5.0);
        assert_eq!(next_occurrence(0.0, 4.0, 3.95, 1e-4), 4.0);
        // Within epsilon of now still counts as this occurrence.
        assert_eq!(next_occurrence(2.0, 4.0, 2.00005, 1e-4), 2.0);
        assert_eq!(next_occurrence(0.5, 4.0, 9.0, 1e-4), 12.5);
    }

    #[test]
    fn each_occurrence_dispatches_once_under_jitter() {
        let (transport, mut store, track) = setup(1);
        let scheduler = LoopScheduler::new(SchedulerConfig::default());
        for offset in [0.0, 1.0, 2.5, 3.75] {
            store.push_event(track, offset, 0, 0.5, 4.0).unwrap();
        }

        // Three loops of 2 s at 120 bpm, ticked at uneven intervals.
        let steps = [0.031, 0.040, 0.022, 0.035, 0.038];
        let mut now = 0.0;
        let mut out = Vec::new();
        let mut i = 0;
        while now < 6.0 - 0.2 {
            scheduler.poll(&transport, &mut store, now, &mut out);
            now += steps[i % steps.len()];
            i += 1;
        }

        assert_eq!(out.len(), 12);
        let mut beats: Vec<f64> = out.iter().map(|d| d.beat).collect();
        beats.sort_by(f64::total_cmp);
        beats.dedup();
        assert_eq!(beats.len(), 12);
        for d in &out {
            assert!((d.at - d.beat / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn stopped_transport_dispatches_nothing() {
        let (mut transport, mut store, track) = setup(1);
        transport.stop();
        store.push_event(track, 0.0, 0, 1.0, 4.0).unwrap();
        let mut out = Vec::new();
        LoopScheduler::new(SchedulerConfig::default()).poll(&transport, &mut store, 0.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn muted_mic_and_recording_tracks_are_skipped() {
        let (mut transport, mut store, armed) = setup(1);
        let muted = store.add_track(None);
        let mic = store.add_track(None);
        let open = store.add_track(None);
        store.track_mut(muted).unwrap().muted = true;
        store.track_mut(mic).unwrap().set_role(Role::Mic);
        for t in [armed, muted, mic, open] {
            store.push_event(t, 0.0, 0, 1.0, 4.0).unwrap();
        }
        transport.set_recording(true);

        let mut out = Vec::new();
        LoopScheduler::new(SchedulerConfig::default()).poll(&transport, &mut store, 0.0, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track, open);
    }

    #[test]
    fn voices_follow_track_role() {
        let (transport, mut store, keys) = setup(1);
        let drums = store.add_drum_track();
        assert_eq!(
            store.track(keys).unwrap().instrument(),
            Instrument::ClassicPiano
        );
        let chord = store.push_event(keys, 0.0, 0, 2.0, 4.0).unwrap();
        let hit = store.push_event(drums, 0.0, 1, 0.25, 4.0).unwrap();
        let ctx = SynthCtx::new(44_100.0, 0.018);

        let track = store.track(keys).unwrap();
        let voice = voice_for(
            track,
            track.event(chord).unwrap(),
            0.5,
            &transport,
            Key::default(),
            &ctx,
        )
        .unwrap();
        assert_eq!(voice.start(), 0.5);
        assert_eq!(voice.layers().len(), 3);

        store.track_mut(keys).unwrap().set_role(Role::Bass);
        let track = store.track(keys).unwrap();
        let voice = voice_for(
            track,
            track.event(chord).unwrap(),
            0.5,
            &transport,
            Key::default(),
            &ctx,
        )
        .unwrap();
        assert_eq!(voice.layers().len(), 1);

        let track = store.track(drums).unwrap();
        let voice = voice_for(
            track,
            track.event(hit).unwrap(),
            1.0,
            &transport,
            Key::default(),
            &ctx,
        )
        .unwrap();
        assert_eq!(voice.start(), 1.0);
    }

    #[test]
    fn out_of_range_pad_is_dropped() {
        let (transport, mut store, keys) = setup(1);
        store.push_event(keys, 0.0, 40, 1.0, 4.0).unwrap();
        let dispatch = Dispatch {
            track: keys,
            event: store.track(keys).unwrap().events()[0].id(),
            beat: 0.0,
            at: 0.0,
        };
        let ctx = SynthCtx::new(44_100.0, 0.018);
        let voices = voices_for(&[dispatch], &store, &transport, Key::default(), &ctx);
        assert!(voices.is_empty());
    }
}
