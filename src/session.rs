//! The trigger interface.
//!
//! A [`Session`] is what a front end drives: pad presses and releases,
//! transport and track edits, and a periodic [`Session::tick`] that runs the
//! scheduler, repeats held drum pads and keeps mic routing current. It never
//! touches audio buffers itself; voices and commands go to an [`AudioHost`],
//! which is the realtime engine in the app and an [`AudioEngine`] in tests and
//! offline tools.
//!
//! [`AudioEngine`]: crate::engine::AudioEngine

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    bounce::{bounce_to_dir, BounceSettings},
    config::{EngineConfig, SchedulerConfig},
    engine::{AudioHost, EngineCommand},
    mic::{InputDevice, MicChain, MicFx, MicState, Microphone},
    preset::Instrument,
    sequencer::{
        recorder::{clamp_drum_speed, drum_repeat_seconds},
        voices_for, Dispatch, DrumPattern, EventStore, LoopPosition, LoopScheduler, Recorder,
        Role, Take, TrackId, Transport,
    },
    synth::{chord_voice, drum_voice, ChordRequest, Sends, SynthCtx, VoiceId},
    theory::{chord_for_pad, Chord, Key, CHORD_PADS},
    voices::DrumKind,
    Error, Result,
};

/// Chord pads plus one pad per drum.
pub const PAD_COUNT: usize = CHORD_PADS + DRUM_SLOTS;
pub const DRUM_SLOTS: usize = 8;

/// Identifies one input source (mouse, finger, key) holding a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

/// Returned by a press; hand it back to release the same hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadHandle {
    pub pointer: PointerId,
    pub pad: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    On,
    Recording,
    MicUnavailable,
}

impl AudioStatus {
    pub fn label(self) -> &'static str {
        match self {
            AudioStatus::On => "Audio: on",
            AudioStatus::Recording => "Audio: on \u{2022} Recording",
            AudioStatus::MicUnavailable => "Audio: on \u{2022} Mic unavailable",
        }
    }
}

/// Snapshot for the display.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub audio: AudioStatus,
    pub playing: bool,
    pub recording: bool,
    pub bpm: f64,
    pub bars: u32,
    pub key: Key,
    pub armed: Option<TrackId>,
    pub last_chord: Option<Chord>,
    pub position: Option<LoopPosition>,
    pub level_db: f32,
    pub mic: MicState,
    pub events: usize,
}

#[derive(Debug)]
enum Hold {
    Chord {
        pad: usize,
        voice: VoiceId,
        take: Option<Take>,
    },
    Drum {
        pad: usize,
        track: TrackId,
        slot: usize,
        next_at: f64,
    },
}

impl Hold {
    fn pad(&self) -> usize {
        match self {
            Hold::Chord { pad, .. } | Hold::Drum { pad, .. } => *pad,
        }
    }
}

pub struct Session<H: AudioHost> {
    host: H,
    engine_config: EngineConfig,
    store: EventStore,
    transport: Transport,
    scheduler: LoopScheduler,
    recorder: Recorder,
    holds: HashMap<PointerId, Hold>,
    key: Key,
    ctx: SynthCtx,
    drum_speeds: [f64; DRUM_SLOTS],
    reverb_level: f32,
    mic: Microphone,
    input: Option<Box<dyn InputDevice>>,
    mic_monitor: bool,
    mic_dirty: bool,
    last_chord: Option<Chord>,
    next_seed: u64,
    dispatches: Vec<Dispatch>,
}

impl<H: AudioHost> Session<H> {
    pub fn new(host: H, engine_config: EngineConfig, scheduler_config: SchedulerConfig) -> Self {
        let transport = Transport::new(scheduler_config.default_bpm, scheduler_config.default_bars)
            .unwrap_or_default();
        let ctx = SynthCtx::new(host.sample_rate(), scheduler_config.strum_step_seconds);
        Self {
            host,
            reverb_level: engine_config.reverb_level,
            engine_config,
            store: EventStore::new(),
            transport,
            recorder: Recorder::new(&scheduler_config),
            scheduler: LoopScheduler::new(scheduler_config),
            holds: HashMap::new(),
            key: Key::default(),
            ctx,
            drum_speeds: [1.0; DRUM_SLOTS],
            mic: Microphone::new(),
            input: None,
            mic_monitor: false,
            mic_dirty: false,
            last_chord: None,
            next_seed: 1,
            dispatches: Vec::new(),
        }
    }

    /// Attach the device mic tracks are fed from.
    pub fn with_input(mut self, device: Box<dyn InputDevice>) -> Self {
        self.input = Some(device);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn scheduler_config(&self) -> &SchedulerConfig {
        self.scheduler.config()
    }

    pub fn reverb_level(&self) -> f32 {
        self.reverb_level
    }

    pub fn is_safe_mode(&self) -> bool {
        self.ctx.safe_mode
    }

    pub fn drum_speed(&self, slot: usize) -> Option<f64> {
        self.drum_speeds.get(slot).copied()
    }

    pub fn mic_monitor(&self) -> bool {
        self.mic_monitor
    }

    fn seed(&mut self) -> u64 {
        self.next_seed = self.next_seed.wrapping_add(1);
        self.next_seed
    }

    /// Caption for a pad under the current key.
    pub fn pad_label(&self, pad: usize) -> Option<String> {
        if pad < CHORD_PADS {
            chord_for_pad(pad, self.key).ok().map(|c| c.symbol())
        } else if pad < PAD_COUNT {
            Some(DrumKind::from_index(pad - CHORD_PADS).name().to_string())
        } else {
            None
        }
    }

    /// Whether any pointer is holding `pad`.
    pub fn is_pad_active(&self, pad: usize) -> bool {
        self.holds.values().any(|hold| hold.pad() == pad)
    }

    // --- pads -------------------------------------------------------------

    /// Start a hold on `pad`. A pointer holds one pad at a time, so an
    /// earlier hold by the same pointer is released first.
    pub fn on_pad_press(&mut self, pad: usize, pointer: PointerId) -> Result<PadHandle> {
        if pad >= PAD_COUNT {
            return Err(Error::PadOutOfRange(pad));
        }
        self.end_hold(pointer)?;
        let now = self.host.now();

        let hold = if pad >= CHORD_PADS {
            let slot = pad - CHORD_PADS;
            let track = self.store.ensure_drum_track();
            self.hit_drum(track, slot, now)?;
            Hold::Drum {
                pad,
                track,
                slot,
                next_at: now + drum_repeat_seconds(self.drum_speeds[slot]),
            }
        } else {
            let chord = chord_for_pad(pad, self.key)?;
            let track = self.store.ensure_melodic_track();
            let seed = self.seed();
            let target = self.store.track(track)?;
            let frequencies = target.role().frequencies(&chord);
            let voice = chord_voice(
                &target.instrument().preset(),
                &ChordRequest {
                    frequencies: &frequencies,
                    start: now,
                    length: None,
                    velocity: target.volume(),
                    sends: Sends::new(1.0, target.reverb_send()),
                    strum: target.strum(),
                    seed,
                },
                &self.ctx,
            );
            let voice_id = voice.id();
            self.host.send(EngineCommand::Start(Box::new(voice)))?;
            let take = self
                .recorder
                .press_chord(&mut self.store, &self.transport, track, pad, now)?;
            debug!(pad, chord = %chord, recorded = take.is_some(), "chord pad pressed");
            self.last_chord = Some(chord);
            Hold::Chord {
                pad,
                voice: voice_id,
                take,
            }
        };

        self.holds.insert(pointer, hold);
        Ok(PadHandle { pointer, pad })
    }

    /// End the hold `handle` started. Stale handles are ignored.
    pub fn on_pad_release(&mut self, handle: PadHandle) -> Result<()> {
        match self.holds.get(&handle.pointer) {
            Some(hold) if hold.pad() == handle.pad => self.end_hold(handle.pointer),
            _ => Ok(()),
        }
    }

    fn end_hold(&mut self, pointer: PointerId) -> Result<()> {
        let Some(hold) = self.holds.remove(&pointer) else {
            return Ok(());
        };
        if let Hold::Chord { voice, take, .. } = hold {
            let now = self.host.now();
            if let Some(take) = take {
                self.recorder
                    .release(&mut self.store, &self.transport, &take, now);
            }
            self.host.send(EngineCommand::Release { voice, at: now })?;
        }
        Ok(())
    }

    fn hit_drum(&mut self, track: TrackId, slot: usize, now: f64) -> Result<()> {
        let seed = self.seed();
        let target = self.store.track(track)?;
        let voice = drum_voice(
            DrumKind::from_index(slot),
            now,
            target.volume(),
            target.reverb_send(),
            seed,
            &self.ctx,
        );
        self.host.send(EngineCommand::Start(Box::new(voice)))?;
        self.recorder.hit_drum(
            &mut self.store,
            &self.transport,
            track,
            slot,
            self.drum_speeds[slot],
            now,
        )?;
        Ok(())
    }

    // --- musical settings -------------------------------------------------

    /// Recorded events keep their pads, so they follow the new key.
    pub fn set_key(&mut self, key: Key) {
        self.key = key;
        info!(%key, "key changed");
    }

    pub fn set_bpm(&mut self, bpm: f64) -> f64 {
        let bpm = self.transport.set_bpm(bpm, self.host.now());
        self.store.reset_guards();
        bpm
    }

    /// Change the loop length, folding recorded events into the new window.
    pub fn set_bar_count(&mut self, bars: u32) -> Result<()> {
        self.transport.set_bars(bars)?;
        self.store.fold(self.transport.loop_beats());
        info!(bars, "loop length changed");
        Ok(())
    }

    // --- tracks -----------------------------------------------------------

    pub fn add_track(&mut self, name: Option<&str>) -> TrackId {
        self.store.add_track(name)
    }

    pub fn arm_track(&mut self, track: TrackId) -> Result<()> {
        self.store.arm(track)
    }

    pub fn arm_next_track(&mut self) -> Option<TrackId> {
        self.store.arm_next()
    }

    /// Flip a track's mute. Returns the new state.
    pub fn toggle_mute(&mut self, track: TrackId) -> Result<bool> {
        let track = self.store.track_mut(track)?;
        track.muted = !track.muted;
        if track.role() == Role::Mic {
            self.mic_dirty = true;
        }
        Ok(track.muted)
    }

    pub fn set_track_role(&mut self, track: TrackId, role: Role) -> Result<()> {
        self.store.track_mut(track)?.set_role(role);
        self.mic_dirty = true;
        Ok(())
    }

    pub fn set_track_instrument(&mut self, track: TrackId, instrument: Instrument) -> Result<()> {
        self.store.track_mut(track)?.set_instrument(instrument);
        Ok(())
    }

    pub fn set_track_volume(&mut self, track: TrackId, volume: f32) -> Result<()> {
        let track = self.store.track_mut(track)?;
        track.set_volume(volume);
        self.mic_dirty |= track.role() == Role::Mic;
        Ok(())
    }

    pub fn set_track_reverb(&mut self, track: TrackId, send: f32) -> Result<()> {
        self.store.track_mut(track)?.set_reverb_send(send);
        Ok(())
    }

    pub fn set_track_strum(&mut self, track: TrackId, strum: bool) -> Result<()> {
        self.store.track_mut(track)?.set_strum(strum);
        Ok(())
    }

    pub fn set_track_mic_fx(&mut self, track: TrackId, fx: MicFx) -> Result<()> {
        let track = self.store.track_mut(track)?;
        track.mic_fx = fx;
        self.mic_dirty |= track.role() == Role::Mic;
        Ok(())
    }

    pub fn clear_track(&mut self, track: TrackId) -> Result<()> {
        self.store.clear_track(track)
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
    }

    pub fn apply_drum_pattern(&mut self, pattern: DrumPattern) -> Result<TrackId> {
        let track = pattern.apply(&mut self.store, &self.transport)?;
        info!(%pattern, %track, "drum pattern applied");
        Ok(track)
    }

    /// Set the repeat speed of one drum slot, clamped to [0.25, 4].
    pub fn set_drum_speed(&mut self, slot: usize, speed: f64) -> Result<f64> {
        let entry = self
            .drum_speeds
            .get_mut(slot)
            .ok_or(Error::PadOutOfRange(CHORD_PADS + slot))?;
        *entry = clamp_drum_speed(speed);
        Ok(*entry)
    }

    // --- mix --------------------------------------------------------------

    pub fn set_reverb_level(&mut self, level: f32) -> Result<()> {
        let level = level.clamp(0.0, 1.0);
        self.host.send(EngineCommand::SetReverbLevel(level))?;
        self.reverb_level = level;
        Ok(())
    }

    /// Safe mode tames the plucked-string feedback for new voices.
    pub fn set_safe_mode(&mut self, safe: bool) {
        self.ctx.safe_mode = safe;
    }

    /// Route the mic to mic-role tracks. The input is requested on the next
    /// tick; turning monitoring on again retries after a failure.
    pub fn set_mic_monitor(&mut self, on: bool) {
        self.mic_monitor = on;
        if on {
            self.mic.retry();
        }
        self.mic_dirty = true;
    }

    // --- transport --------------------------------------------------------

    pub fn start_transport(&mut self) -> Result<()> {
        if self.transport.is_playing() {
            return Ok(());
        }
        self.store.ensure_track();
        let now = self.host.now();
        self.host.send(EngineCommand::EnsureAudible { at: now })?;
        self.transport.start(now);
        self.store.reset_guards();
        Ok(())
    }

    /// Stop playback and recording, releasing every hold and fading out
    /// whatever is still sounding.
    pub fn stop_transport(&mut self) -> Result<()> {
        self.transport.stop();
        let pointers: Vec<PointerId> = self.holds.keys().copied().collect();
        for pointer in pointers {
            self.end_hold(pointer)?;
        }
        self.host.send(EngineCommand::ReleaseAll {
            at: self.host.now(),
            fade: self.engine_config.stop_fade_seconds,
        })?;
        self.store.reset_guards();
        Ok(())
    }

    /// Toggle recording, starting playback first if needed. Returns whether
    /// recording is now on.
    pub fn toggle_record(&mut self) -> Result<bool> {
        if !self.transport.is_playing() {
            self.start_transport()?;
        }
        if self.store.is_empty() {
            self.store.add_track(Some("Track 1"));
        }
        if self.store.armed_track().map(|t| t.role()) == Some(Role::Mic) {
            let other = self
                .store
                .tracks()
                .iter()
                .find(|t| t.role() != Role::Mic)
                .map(|t| t.id());
            if let Some(id) = other {
                self.store.arm(id)?;
            }
        }
        let recording = !self.transport.is_recording();
        self.transport.set_recording(recording);
        Ok(recording)
    }

    /// Stop everything and drop the master to silence, restoring it shortly
    /// after.
    pub fn panic(&mut self) -> Result<()> {
        self.stop_transport()?;
        let at = self.host.now();
        self.host.send(EngineCommand::Panic { at })
    }

    /// Render one loop of the current arrangement into `dir`.
    pub fn bounce(&self, dir: &Path) -> Result<PathBuf> {
        let settings = BounceSettings {
            bpm: self.transport.bpm(),
            bars: self.transport.bars(),
            key: self.key,
            safe_mode: self.ctx.safe_mode,
            reverb_level: self.reverb_level,
        };
        bounce_to_dir(
            dir,
            &self.store,
            &settings,
            &self.engine_config,
            self.scheduler.config(),
        )
    }

    // --- control loop -----------------------------------------------------

    /// Run one control step. Call every poll interval; failures are logged
    /// and never stop the loop.
    pub fn tick(&mut self) {
        let now = self.host.now();
        self.repeat_drums(now);
        self.schedule(now);
        self.route_mic();
    }

    fn repeat_drums(&mut self, now: f64) {
        let mut due = Vec::new();
        for hold in self.holds.values_mut() {
            if let Hold::Drum {
                track,
                slot,
                next_at,
                ..
            } = hold
            {
                if now >= *next_at {
                    due.push((*track, *slot));
                    let interval = drum_repeat_seconds(self.drum_speeds[*slot]);
                    *next_at = (*next_at + interval).max(now + interval * 0.5);
                }
            }
        }
        for (track, slot) in due {
            if let Err(err) = self.hit_drum(track, slot, now) {
                warn!(%track, slot, %err, "drum repeat failed");
            }
        }
    }

    fn schedule(&mut self, now: f64) {
        self.dispatches.clear();
        self.scheduler
            .poll(&self.transport, &mut self.store, now, &mut self.dispatches);
        if self.dispatches.is_empty() {
            return;
        }
        let voices = voices_for(
            &self.dispatches,
            &self.store,
            &self.transport,
            self.key,
            &self.ctx,
        );
        for voice in voices {
            if let Err(err) = self.host.send(EngineCommand::Start(Box::new(voice))) {
                warn!(%err, "scheduled voice dropped");
            }
        }
    }

    fn route_mic(&mut self) {
        if !self.mic_dirty {
            return;
        }
        self.mic_dirty = false;

        let sample_rate = self.host.sample_rate();
        let chains: Vec<MicChain> = if self.mic_monitor {
            self.store
                .tracks()
                .iter()
                .filter(|t| t.role() == Role::Mic && !t.muted)
                .map(|t| MicChain::new(&t.mic_fx, t.volume(), sample_rate))
                .collect()
        } else {
            Vec::new()
        };

        if !chains.is_empty() {
            self.mic.request();
            let device = self.input.as_deref_mut().map(|d| d as &mut dyn InputDevice);
            if let Some(stream) = self.mic.poll(device) {
                if let Err(err) = self.host.send(EngineCommand::AttachMic(stream)) {
                    warn!(%err, "mic stream dropped");
                }
            }
        }

        let routes = if self.mic.is_ready() { chains } else { Vec::new() };
        debug!(routes = routes.len(), "mic routing");
        if let Err(err) = self.host.send(EngineCommand::SetMicRoutes(routes)) {
            warn!(%err, "mic routing update dropped");
            self.mic_dirty = true;
        }
    }

    // --- display ----------------------------------------------------------

    pub fn loop_position(&self) -> Option<LoopPosition> {
        self.transport
            .is_playing()
            .then(|| self.transport.position(self.host.now()))
    }

    pub fn status(&self) -> SessionStatus {
        let audio = if self.mic_monitor && self.mic.is_unavailable() {
            AudioStatus::MicUnavailable
        } else if self.transport.is_recording() {
            AudioStatus::Recording
        } else {
            AudioStatus::On
        };
        SessionStatus {
            audio,
            playing: self.transport.is_playing(),
            recording: self.transport.is_recording(),
            bpm: self.transport.bpm(),
            bars: self.transport.bars(),
            key: self.key,
            armed: self.store.armed(),
            last_chord: self.last_chord.clone(),
            position: self.loop_position(),
            level_db: self.host.level_db(),
            mic: self.mic.state().clone(),
            events: self.store.event_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioEngine;
    use rtrb::{Consumer, RingBuffer};

    fn session() -> Session<AudioEngine> {
        let config = EngineConfig {
            reverb_seconds: 0.1,
            ..EngineConfig::default()
        };
        let engine = AudioEngine::live(&config, 8_000.0);
        Session::new(engine, config, SchedulerConfig::default())
    }

    /// Advance the engine clock by `seconds`, ticking like the app does.
    fn run(session: &mut Session<AudioEngine>, seconds: f64) {
        let step = 0.035;
        let mut elapsed = 0.0;
        while elapsed < seconds {
            session.tick();
            session.host_mut().render((step * 8_000.0) as usize);
            elapsed += step;
        }
    }

    const FINGER: PointerId = PointerId(1);

    #[test]
    fn first_press_creates_a_track_and_a_voice() {
        let mut s = session();
        let handle = s.on_pad_press(0, FINGER).unwrap();
        assert_eq!(s.store().tracks().len(), 1);
        assert_eq!(s.host().voice_count(), 1);
        assert!(s.is_pad_active(0));
        assert_eq!(s.status().last_chord.unwrap().symbol(), "C");

        s.on_pad_release(handle).unwrap();
        assert!(!s.is_pad_active(0));
        // Held voices only end once released.
        run(&mut s, 2.0);
        assert_eq!(s.host().voice_count(), 0);
    }

    #[test]
    fn pads_out_of_range_fail() {
        let mut s = session();
        assert!(matches!(
            s.on_pad_press(PAD_COUNT, FINGER),
            Err(Error::PadOutOfRange(24))
        ));
    }

    #[test]
    fn one_hold_per_pointer() {
        let mut s = session();
        let first = s.on_pad_press(0, FINGER).unwrap();
        s.on_pad_press(3, FINGER).unwrap();
        assert!(!s.is_pad_active(0));
        assert!(s.is_pad_active(3));
        // The stale handle does nothing.
        s.on_pad_release(first).unwrap();
        assert!(s.is_pad_active(3));
    }

    #[test]
    fn recording_writes_held_length() {
        let mut s = session();
        s.set_bpm(120.0);
        assert!(s.toggle_record().unwrap());
        run(&mut s, 0.5);

        let handle = s.on_pad_press(5, FINGER).unwrap();
        run(&mut s, 1.0);
        s.on_pad_release(handle).unwrap();

        let track = &s.store().tracks()[0];
        assert_eq!(track.events().len(), 1);
        let event = &track.events()[0];
        assert_eq!(event.pad(), 5);
        assert!((event.duration() - 2.0).abs() <= 0.25);
    }

    #[test]
    fn drum_pads_repeat_while_held() {
        let mut s = session();
        s.set_drum_speed(0, 2.0).unwrap();
        s.toggle_record().unwrap();
        let handle = s.on_pad_press(CHORD_PADS, FINGER).unwrap();
        run(&mut s, 0.5);
        s.on_pad_release(handle).unwrap();

        let drums = s
            .store()
            .tracks()
            .iter()
            .find(|t| t.role() == Role::Drums)
            .unwrap();
        // Every 125 ms for half a second, plus the first hit.
        assert!(drums.events().len() >= 4);
        assert!(drums.events().iter().all(|e| e.duration() == 0.125));
    }

    #[test]
    fn record_toggle_starts_transport_and_skips_mic_track() {
        let mut s = session();
        let mic = s.add_track(Some("Vox"));
        let keys = s.add_track(Some("Keys"));
        s.set_track_role(mic, Role::Mic).unwrap();
        s.arm_track(mic).unwrap();

        assert!(s.toggle_record().unwrap());
        assert!(s.transport().is_playing());
        assert_eq!(s.store().armed(), Some(keys));
        assert_eq!(s.status().audio, AudioStatus::Recording);

        assert!(!s.toggle_record().unwrap());
    }

    #[test]
    fn recorded_events_loop() {
        let mut s = session();
        s.set_bpm(120.0);
        s.set_bar_count(1).unwrap();
        s.toggle_record().unwrap();
        let handle = s.on_pad_press(0, FINGER).unwrap();
        s.on_pad_release(handle).unwrap();
        s.toggle_record().unwrap();

        // The armed track plays back now that recording is off: by 4.5 s
        // the occurrence on beat 8 (third cycle) has been dispatched.
        run(&mut s, 4.5);
        let track = &s.store().tracks()[0];
        let event = track.events()[0].id();
        assert_eq!(track.last_scheduled(event), Some(8.0));
    }

    #[test]
    fn stop_releases_everything() {
        let mut s = session();
        s.start_transport().unwrap();
        s.on_pad_press(0, FINGER).unwrap();
        s.on_pad_press(CHORD_PADS + 2, PointerId(2)).unwrap();
        s.stop_transport().unwrap();
        assert!(!s.is_pad_active(0));
        assert!(!s.transport().is_playing());
        run(&mut s, 0.3);
        assert_eq!(s.host().voice_count(), 0);
    }

    #[test]
    fn panic_restores_master_once() {
        let mut s = session();
        s.start_transport().unwrap();
        s.on_pad_press(2, FINGER).unwrap();
        run(&mut s, 0.1);
        s.panic().unwrap();
        run(&mut s, 0.5);
        assert_eq!(s.host().voice_count(), 0);
        assert_eq!(s.host().mixer().restore_count(), 1);
        assert!((s.host().mixer().master_at(s.host().now()) - 0.78).abs() < 1e-4);
    }

    #[test]
    fn bar_change_folds_events() {
        let mut s = session();
        let track = s.add_track(None);
        let loop_beats = s.transport().loop_beats();
        let event = s
            .store
            .push_event(track, 10.0, 0, 6.0, loop_beats)
            .unwrap();
        s.set_bar_count(2).unwrap();
        let event = s.store().track(track).unwrap().event(event).unwrap();
        assert_eq!(event.offset(), 2.0);
        assert!(s.set_bar_count(3).is_err());
    }

    #[test]
    fn drum_speed_is_clamped() {
        let mut s = session();
        assert_eq!(s.set_drum_speed(1, 10.0).unwrap(), 4.0);
        assert_eq!(s.set_drum_speed(1, 0.1).unwrap(), 0.25);
        assert!(s.set_drum_speed(8, 1.0).is_err());
    }

    struct FakeInput {
        fail: bool,
        keep: Option<rtrb::Producer<f32>>,
    }

    impl InputDevice for FakeInput {
        fn open(&mut self) -> Result<Consumer<f32>> {
            if self.fail {
                return Err(Error::MicUnavailable("denied".into()));
            }
            let (tx, rx) = RingBuffer::new(64);
            self.keep = Some(tx);
            Ok(rx)
        }
    }

    #[test]
    fn mic_is_acquired_for_mic_tracks() {
        let mut s = session().with_input(Box::new(FakeInput {
            fail: false,
            keep: None,
        }));
        let vox = s.add_track(Some("Vox"));
        s.set_track_role(vox, Role::Mic).unwrap();
        s.set_mic_monitor(true);
        s.tick();
        assert_eq!(s.status().mic, MicState::Ready);
        assert_eq!(s.status().audio, AudioStatus::On);
    }

    #[test]
    fn denied_mic_is_reported() {
        let mut s = session().with_input(Box::new(FakeInput {
            fail: true,
            keep: None,
        }));
        let vox = s.add_track(Some("Vox"));
        s.set_track_role(vox, Role::Mic).unwrap();
        s.set_mic_monitor(true);
        s.tick();
        assert_eq!(s.status().audio, AudioStatus::MicUnavailable);

        // Without any device the outcome is the same.
        let mut bare = session();
        let vox = bare.add_track(None);
        bare.set_track_role(vox, Role::Mic).unwrap();
        bare.set_mic_monitor(true);
        bare.tick();
        assert!(matches!(bare.status().mic, MicState::Failed(_)));
    }

    #[test]
    fn bounce_writes_a_wav() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session();
        s.set_bar_count(1).unwrap();
        let path = s.bounce(dir.path()).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("powerchord-bounce-"));
        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len, 44 + 105_840 * 4);
    }
}
