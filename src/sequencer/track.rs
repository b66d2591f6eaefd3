//! Tracks and their recorded events.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    mic::MicFx,
    preset::Instrument,
    theory::{mtof, Chord},
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub(crate) u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub(crate) u64);

impl EventId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What part a track plays, and so which notes of a chord it sounds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    Chord,
    Bass,
    Lead,
    Drums,
    Mic,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Chord, Role::Bass, Role::Lead, Role::Drums, Role::Mic];

    pub fn id(self) -> &'static str {
        match self {
            Role::Chord => "chord",
            Role::Bass => "bass",
            Role::Lead => "lead",
            Role::Drums => "drums",
            Role::Mic => "mic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Chord => "Chord",
            Role::Bass => "Bass",
            Role::Lead => "Lead",
            Role::Drums => "Drums",
            Role::Mic => "Mic",
        }
    }

    /// Notes of `chord` this role sounds: the root an octave down for bass,
    /// the top note for lead, the full triad otherwise.
    pub fn frequencies(self, chord: &Chord) -> Vec<f32> {
        match self {
            Role::Bass => vec![mtof(chord.root_midi() as f32 - 12.0)],
            Role::Lead => chord.frequencies()[2..].to_vec(),
            Role::Chord | Role::Drums | Role::Mic => chord.frequencies().to_vec(),
        }
    }

    /// Roles that take chord pads.
    pub fn is_melodic(self) -> bool {
        !matches!(self, Role::Drums | Role::Mic)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.id() == s)
            .ok_or_else(|| format!("unknown role {s:?}"))
    }
}

/// One recorded trigger. Only the duration changes after creation, and only
/// once, when the recording pad is released.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: EventId,
    offset: f64,
    pad: usize,
    duration: f64,
}

impl Event {
    pub(crate) fn new(id: EventId, offset: f64, pad: usize, duration: f64) -> Self {
        Self {
            id,
            offset,
            pad,
            duration,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    /// Beats from the start of the loop.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Chord pad (0–15) or drum slot (0–7) depending on the track role.
    pub fn pad(&self) -> usize {
        self.pad
    }

    /// Length in beats.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub(crate) fn set_duration(&mut self, beats: f64) {
        self.duration = beats;
    }

    pub(crate) fn fold(&mut self, loop_beats: f64) {
        self.offset = self.offset.rem_euclid(loop_beats);
        self.duration = self.duration.min(loop_beats);
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    pub name: String,
    role: Role,
    instrument: Instrument,
    strum: bool,
    reverb_send: f32,
    volume: f32,
    pub muted: bool,
    pub mic_fx: MicFx,
    pub(crate) events: Vec<Event>,
    /// Absolute beat of the occurrence last dispatched, per event.
    pub(crate) last_scheduled: HashMap<EventId, f64>,
}

impl Track {
    pub(crate) fn new(id: TrackId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: Role::Chord,
            instrument: Instrument::ClassicPiano,
            strum: false,
            reverb_send: 0.22,
            volume: 1.0,
            muted: false,
            mic_fx: MicFx::default(),
            events: Vec::new(),
            last_scheduled: HashMap::new(),
        }
    }

    pub(crate) fn drums(id: TrackId, name: impl Into<String>) -> Self {
        let mut track = Self::new(id, name);
        track.set_role(Role::Drums);
        track.reverb_send = 0.12;
        track.volume = 0.95;
        track
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Drums and mic roles pin their instrument.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        match role {
            Role::Drums => self.instrument = Instrument::DrumKit,
            Role::Mic => self.instrument = Instrument::Microphone,
            Role::Chord | Role::Bass | Role::Lead => {}
        }
        if !self.instrument.supports_strum() {
            self.strum = false;
        }
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
        if !instrument.supports_strum() {
            self.strum = false;
        }
    }

    pub fn strum(&self) -> bool {
        self.strum
    }

    /// Ignored for instruments that cannot strum.
    pub fn set_strum(&mut self, strum: bool) {
        self.strum = strum && self.instrument.supports_strum();
    }

    pub fn reverb_send(&self) -> f32 {
        self.reverb_send
    }

    pub fn set_reverb_send(&mut self, send: f32) {
        self.reverb_send = send.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub(crate) fn event_mut(&mut self, id: EventId) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.id == id)
    }

    pub(crate) fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Remove every event and forget what was dispatched.
    pub fn clear(&mut self) {
        self.events.clear();
        self.last_scheduled.clear();
    }

    pub fn reset_guards(&mut self) {
        self.last_scheduled.clear();
    }

    pub(crate) fn fold(&mut self, loop_beats: f64) {
        for event in &mut self.events {
            event.fold(loop_beats);
        }
        self.last_scheduled.clear();
    }

    pub fn last_scheduled(&self, event: EventId) -> Option<f64> {
        self.last_scheduled.get(&event).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::{chord_for_pad, Key};

    #[test]
    fn role_subsets() {
        let chord = chord_for_pad(0, Key::default()).unwrap();
        assert_eq!(Role::Chord.frequencies(&chord).len(), 3);

        let bass = Role::Bass.frequencies(&chord);
        assert_eq!(bass.len(), 1);
        assert!((bass[0] - 65.41).abs() < 0.01);

        let lead = Role::Lead.frequencies(&chord);
        assert_eq!(lead, vec![chord.frequencies()[2]]);
    }

    #[test]
    fn drum_and_mic_roles_pin_instrument() {
        let mut track = Track::new(TrackId(1), "Track 1");
        track.set_instrument(Instrument::AcousticGuitar);
        track.set_strum(true);
        assert!(track.strum());

        track.set_role(Role::Drums);
        assert_eq!(track.instrument(), Instrument::DrumKit);
        assert!(!track.strum());

        track.set_role(Role::Mic);
        assert_eq!(track.instrument(), Instrument::Microphone);
    }

    #[test]
    fn strum_needs_a_strummable_instrument() {
        let mut track = Track::new(TrackId(1), "Keys");
        track.set_strum(true);
        assert!(!track.strum());

        track.set_instrument(Instrument::ElectricGuitar);
        track.set_strum(true);
        track.set_instrument(Instrument::WarmPad);
        assert!(!track.strum());
    }

    #[test]
    fn fold_wraps_offsets_and_clamps_durations() {
        let mut track = Track::new(TrackId(1), "Track 1");
        track.push(Event::new(EventId(1), 10.0, 0, 12.0));
        track.push(Event::new(EventId(2), 7.75, 3, 0.5));
        track.last_scheduled.insert(EventId(1), 10.0);

        track.fold(8.0);
        assert_eq!(track.events()[0].offset(), 2.0);
        assert_eq!(track.events()[0].duration(), 8.0);
        assert_eq!(track.events()[1].offset(), 7.75);
        assert!(track.last_scheduled.is_empty());
    }

    #[test]
    fn role_ids_parse() {
        for role in Role::ALL {
            assert_eq!(role.id().parse::<Role>().unwrap(), role);
        }
        assert!("vocals".parse::<Role>().is_err());
    }

    #[test]
    fn levels_are_clamped() {
        let mut track = Track::drums(TrackId(2), "Drums");
        assert_eq!(track.volume(), 0.95);
        assert_eq!(track.reverb_send(), 0.12);
        track.set_volume(1.5);
        track.set_reverb_send(-0.2);
        assert_eq!(track.volume(), 1.0);
        assert_eq!(track.reverb_send(), 0.0);
    }
}
