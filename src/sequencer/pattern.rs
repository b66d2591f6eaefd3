use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    store::EventStore,
    track::TrackId,
    transport::{Transport, BEATS_PER_BAR},
};
use crate::{voices::DrumKind, Result};

/// Preset drum grooves that replace a drum track's events.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrumPattern {
    Rock,
    HipHop,
}

impl DrumPattern {
    pub const ALL: [DrumPattern; 2] = [DrumPattern::Rock, DrumPattern::HipHop];

    pub fn id(self) -> &'static str {
        match self {
            DrumPattern::Rock => "rock",
            DrumPattern::HipHop => "hiphop",
        }
    }

    fn hat_length(self) -> f64 {
        match self {
            DrumPattern::Rock => 0.20,
            DrumPattern::HipHop => 0.18,
        }
    }

    /// (beat in bar, drum, length) hits repeated every bar.
    fn bar(self) -> &'static [(f64, DrumKind, f64)] {
        match self {
            DrumPattern::Rock => &[
                (0.0, DrumKind::Kick, 0.25),
                (2.0, DrumKind::Kick, 0.25),
                (1.0, DrumKind::Snare, 0.25),
                (3.0, DrumKind::Snare, 0.25),
            ],
            DrumPattern::HipHop => &[
                (0.0, DrumKind::Kick, 0.25),
                (1.5, DrumKind::Kick, 0.25),
                (2.5, DrumKind::Kick, 0.25),
                (1.0, DrumKind::Snare, 0.25),
                (3.0, DrumKind::Snare, 0.25),
                (3.5, DrumKind::Clap, 0.20),
            ],
        }
    }

    /// Write the pattern over the drum track (found or created and armed).
    pub fn apply(self, store: &mut EventStore, transport: &Transport) -> Result<TrackId> {
        let track = store.ensure_drum_track();
        store.clear_track(track)?;
        let loop_beats = transport.loop_beats();

        let mut beat = 0.0;
        while beat < loop_beats {
            store.push_event(track, beat, DrumKind::Hat.index(), self.hat_length(), loop_beats)?;
            beat += 0.5;
        }
        for bar in 0..transport.bars() {
            let origin = (bar * BEATS_PER_BAR) as f64;
            for &(at, kind, length) in self.bar() {
                store.push_event(track, origin + at, kind.index(), length, loop_beats)?;
            }
        }
        Ok(track)
    }
}

impl fmt::Display for DrumPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DrumPattern {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DrumPattern::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| format!("unknown drum pattern {s:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::track::Role;

    #[test]
    fn rock_fills_every_bar() {
        let transport = Transport::new(100.0, 2).unwrap();
        let mut store = EventStore::new();
        let track = DrumPattern::Rock.apply(&mut store, &transport).unwrap();
        let track = store.track(track).unwrap();
        assert_eq!(track.role(), Role::Drums);
        // 16 hats plus 4 hits per bar.
        assert_eq!(track.events().len(), 16 + 8);
        let kicks: Vec<f64> = track
            .events()
            .iter()
            .filter(|e| e.pad() == DrumKind::Kick.index())
            .map(|e| e.offset())
            .collect();
        assert_eq!(kicks, vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn applying_replaces_previous_events() {
        let transport = Transport::new(100.0, 1).unwrap();
        let mut store = EventStore::new();
        DrumPattern::Rock.apply(&mut store, &transport).unwrap();
        let track = DrumPattern::HipHop.apply(&mut store, &transport).unwrap();
        assert_eq!(store.tracks().len(), 1);
        let track = store.track(track).unwrap();
        assert_eq!(track.events().len(), 8 + 6);
        assert!(track
            .events()
            .iter()
            .any(|e| e.pad() == DrumKind::Clap.index() && e.offset() == 3.5));
    }

    #[test]
    fn pattern_ids_parse() {
        assert_eq!("hiphop".parse::<DrumPattern>().unwrap(), DrumPattern::HipHop);
        assert!("polka".parse::<DrumPattern>().is_err());
    }
}
