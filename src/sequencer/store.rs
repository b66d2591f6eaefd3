use tracing::debug;

use super::track::{Event, EventId, Role, Track, TrackId};
use crate::{Error, Result};

/// All tracks, the armed slot and the id counters.
///
/// Exactly one track can be armed; the store owns that choice so a track
/// cannot arm itself.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    tracks: Vec<Track>,
    armed: Option<TrackId>,
    next_track: u64,
    next_event: u64,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, id: TrackId) -> Result<&Track> {
        self.tracks
            .iter()
            .find(|t| t.id() == id)
            .ok_or(Error::UnknownTrack(id))
    }

    pub fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or(Error::UnknownTrack(id))
    }

    /// Position of a track in display order.
    pub fn index_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id() == id)
    }

    fn next_track_id(&mut self) -> TrackId {
        self.next_track += 1;
        TrackId(self.next_track)
    }

    fn insert(&mut self, track: Track) -> TrackId {
        let id = track.id();
        debug!(%id, name = %track.name, role = %track.role(), "track added");
        self.tracks.push(track);
        if self.armed.is_none() {
            self.armed = Some(id);
        }
        id
    }

    /// Add a chord track. The first track added is armed.
    pub fn add_track(&mut self, name: Option<&str>) -> TrackId {
        let id = self.next_track_id();
        let name = name.map_or_else(|| format!("Track {}", self.tracks.len() + 1), str::to_string);
        self.insert(Track::new(id, name))
    }

    pub fn add_drum_track(&mut self) -> TrackId {
        let id = self.next_track_id();
        self.insert(Track::drums(id, "Drums"))
    }

    pub fn armed(&self) -> Option<TrackId> {
        self.armed
    }

    pub fn armed_track(&self) -> Option<&Track> {
        self.armed.and_then(|id| self.track(id).ok())
    }

    pub fn is_armed(&self, id: TrackId) -> bool {
        self.armed == Some(id)
    }

    pub fn arm(&mut self, id: TrackId) -> Result<()> {
        self.track(id)?;
        self.armed = Some(id);
        Ok(())
    }

    /// Arm the track after the armed one, wrapping around.
    pub fn arm_next(&mut self) -> Option<TrackId> {
        if self.tracks.is_empty() {
            return None;
        }
        let next = self
            .armed
            .and_then(|id| self.index_of(id))
            .map_or(0, |i| (i + 1) % self.tracks.len());
        let id = self.tracks[next].id();
        self.armed = Some(id);
        Some(id)
    }

    /// The armed track, creating and arming `Track 1` if there are none.
    pub fn ensure_track(&mut self) -> TrackId {
        if let Some(id) = self.armed {
            return id;
        }
        match self.tracks.first() {
            Some(track) => {
                let id = track.id();
                self.armed = Some(id);
                id
            }
            None => self.add_track(Some("Track 1")),
        }
    }

    /// Track for drum pads: the armed track if it plays drums, else the
    /// first drum track, else a new one. The result is armed.
    pub fn ensure_drum_track(&mut self) -> TrackId {
        if let Some(track) = self.armed_track() {
            if track.role() == Role::Drums {
                return track.id();
            }
        }
        let id = match self.tracks.iter().find(|t| t.role() == Role::Drums) {
            Some(track) => track.id(),
            None => self.add_drum_track(),
        };
        self.armed = Some(id);
        id
    }

    /// Track for chord pads. An armed drum or mic track hands over to the
    /// first melodic track, created if needed; the result is armed.
    pub fn ensure_melodic_track(&mut self) -> TrackId {
        let armed = self.ensure_track();
        if self.track(armed).map_or(false, |t| t.role().is_melodic()) {
            return armed;
        }
        let id = match self.tracks.iter().find(|t| t.role().is_melodic()) {
            Some(track) => track.id(),
            None => self.add_track(Some("Track 1")),
        };
        self.armed = Some(id);
        id
    }

    /// Append an event. `offset` is folded into the loop window; the
    /// duration must be positive and finite.
    pub fn push_event(
        &mut self,
        track: TrackId,
        offset: f64,
        pad: usize,
        duration: f64,
        loop_beats: f64,
    ) -> Result<EventId> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(Error::InvalidDuration(duration));
        }
        let id = EventId(self.next_event + 1);
        let track = self.track_mut(track)?;
        track.push(Event::new(id, offset.rem_euclid(loop_beats), pad, duration));
        self.next_event += 1;
        Ok(id)
    }

    /// Write the final duration of a recorded event. Returns false if the
    /// event no longer exists (cleared while held).
    pub fn set_duration(&mut self, track: TrackId, event: EventId, beats: f64) -> bool {
        match self.track_mut(track).ok().and_then(|t| t.event_mut(event)) {
            Some(event) => {
                event.set_duration(beats);
                true
            }
            None => false,
        }
    }

    pub fn clear_track(&mut self, id: TrackId) -> Result<()> {
        self.track_mut(id)?.clear();
        Ok(())
    }

    pub fn clear_all(&mut self) {
        for track in &mut self.tracks {
            track.clear();
        }
    }

    pub fn reset_guards(&mut self) {
        for track in &mut self.tracks {
            track.reset_guards();
        }
    }

    /// Re-fold every event into a loop of `loop_beats` and reset guards.
    pub fn fold(&mut self, loop_beats: f64) {
        for track in &mut self.tracks {
            track.fold(loop_beats);
        }
    }

    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(|t| t.events().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_track_is_armed() {
        let mut store = EventStore::new();
        let a = store.add_track(None);
        let b = store.add_track(Some("Keys"));
        assert_eq!(store.armed(), Some(a));
        assert_eq!(store.track(b).unwrap().name, "Keys");
        assert_eq!(store.track(a).unwrap().name, "Track 1");

        store.arm(b).unwrap();
        assert!(store.is_armed(b));
        assert!(!store.is_armed(a));
    }

    #[test]
    fn events_need_a_positive_duration() {
        let mut store = EventStore::new();
        let track = store.add_track(None);
        for bad in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                store.push_event(track, 1.0, 0, bad, 16.0),
                Err(Error::InvalidDuration(_))
            ));
        }
        assert_eq!(store.event_count(), 0);

        let id = store.push_event(track, 1.0, 0, 0.25, 16.0).unwrap();
        assert_eq!(id.get(), 1);
    }

    #[test]
    fn arming_an_unknown_track_fails() {
        let mut store = EventStore::new();
        let err = store.arm(TrackId(42)).unwrap_err();
        assert!(matches!(err, Error::UnknownTrack(TrackId(42))));
        assert_eq!(store.armed(), None);
    }

    #[test]
    fn implicit_track_on_first_use() {
        let mut store = EventStore::new();
        let id = store.ensure_track();
        assert_eq!(store.tracks().len(), 1);
        assert_eq!(store.ensure_track(), id);
    }

    #[test]
    fn drum_pads_find_or_create_drum_track() {
        let mut store = EventStore::new();
        let keys = store.add_track(None);
        let drums = store.ensure_drum_track();
        assert_ne!(keys, drums);
        assert_eq!(store.track(drums).unwrap().role(), Role::Drums);
        assert_eq!(store.armed(), Some(drums));
        assert_eq!(store.ensure_drum_track(), drums);
        assert_eq!(store.tracks().len(), 2);
    }

    #[test]
    fn chord_pads_leave_drum_track() {
        let mut store = EventStore::new();
        let drums = store.ensure_drum_track();
        let melodic = store.ensure_melodic_track();
        assert_ne!(drums, melodic);
        assert_eq!(store.armed(), Some(melodic));

        store.arm(drums).unwrap();
        assert_eq!(store.ensure_melodic_track(), melodic);
        assert_eq!(store.tracks().len(), 2);
    }

    #[test]
    fn event_ids_increase() {
        let mut store = EventStore::new();
        let t = store.add_track(None);
        let a = store.push_event(t, 1.0, 0, 1.0, 16.0).unwrap();
        let b = store.push_event(t, -0.5, 2, 1.0, 16.0).unwrap();
        assert!(b > a);
        assert_eq!(store.track(t).unwrap().event(b).unwrap().offset(), 15.5);
        assert!(store.push_event(TrackId(99), 0.0, 0, 1.0, 16.0).is_err());
        assert_eq!(store.event_count(), 2);
    }

    #[test]
    fn durations_are_written_back() {
        let mut store = EventStore::new();
        let t = store.add_track(None);
        let e = store.push_event(t, 0.0, 0, 1.0, 16.0).unwrap();
        assert!(store.set_duration(t, e, 2.5));
        assert_eq!(store.track(t).unwrap().event(e).unwrap().duration(), 2.5);

        store.clear_track(t).unwrap();
        assert!(!store.set_duration(t, e, 1.0));
    }

    #[test]
    fn arm_next_wraps() {
        let mut store = EventStore::new();
        let a = store.add_track(None);
        let b = store.add_track(None);
        assert_eq!(store.arm_next(), Some(b));
        assert_eq!(store.arm_next(), Some(a));
    }
}
