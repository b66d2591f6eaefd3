//! Pad-to-chord mapping.
//!
//! The 16 chord pads form two rows over the major scale of the current key:
//! pads 0–7 play major triads on degrees 1..8, pads 8–15 the minor triads on
//! the same roots. The tonic sits at C3 (midi 48) and chords are stacked
//! upward without wrapping, so pad 7 is the tonic an octave up.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of chord pads (major row followed by minor row).
pub const CHORD_PADS: usize = 16;

const DEGREE_STEPS: [u8; 8] = [0, 2, 4, 5, 7, 9, 11, 12];
const DIATONIC: [Quality; 8] = [
    Quality::Major,
    Quality::Minor,
    Quality::Minor,
    Quality::Major,
    Quality::Major,
    Quality::Minor,
    Quality::Diminished,
    Quality::Major,
];
const BASE_MIDI: u8 = 48;

/// Convert a (possibly fractional) midi note number to Hz. A4 = 440 Hz = 69.
#[inline]
pub fn mtof(midi: f32) -> f32 {
    440.0 * 2.0_f32.powf((midi - 69.0) / 12.0)
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Keys in circle-of-fifths order, starting at C.
    pub const FIFTHS: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::G,
        PitchClass::D,
        PitchClass::A,
        PitchClass::E,
        PitchClass::B,
        PitchClass::FSharp,
        PitchClass::CSharp,
        PitchClass::GSharp,
        PitchClass::DSharp,
        PitchClass::ASharp,
        PitchClass::F,
    ];

    pub fn semitone(self) -> u8 {
        self as u8
    }

    pub fn from_semitone(semitone: u8) -> Self {
        Self::ALL[(semitone % 12) as usize]
    }

    /// Name with an ASCII sharp, e.g. `F#`.
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Name with a typographic sharp, e.g. `F♯`.
    pub fn pretty(self) -> String {
        self.name().replace('#', "♯")
    }
}

impl FromStr for PitchClass {
    type Err = Error;

    /// Accepts `C#`, `C♯` and the flat spellings `Db`/`D♭`.
    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        let letter = chars
            .next()
            .ok_or_else(|| Error::UnknownKey(s.to_string()))?;
        let natural = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(Error::UnknownKey(s.to_string())),
        };
        let semitone = match chars.as_str() {
            "" => natural,
            "#" | "♯" => natural + 1,
            "b" | "♭" => natural + 11,
            _ => return Err(Error::UnknownKey(s.to_string())),
        };
        Ok(Self::from_semitone(semitone))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tonic of the current key. Pads are always laid out over its major scale.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub PitchClass);

impl Key {
    pub fn tonic(self) -> PitchClass {
        self.0
    }

    /// Step `steps` positions around the circle of fifths (negative = flatwards).
    pub fn step_fifths(self, steps: i32) -> Self {
        let pos = PitchClass::FIFTHS
            .iter()
            .position(|&pc| pc == self.0)
            .unwrap_or(0) as i32;
        Key(PitchClass::FIFTHS[(pos + steps).rem_euclid(12) as usize])
    }
}

impl Default for Key {
    fn default() -> Self {
        Key(PitchClass::C)
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse().map(Key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    Major,
    Minor,
    Diminished,
}

impl Quality {
    fn intervals(self) -> [u8; 3] {
        match self {
            Quality::Major => [0, 4, 7],
            Quality::Minor => [0, 3, 7],
            Quality::Diminished => [0, 3, 6],
        }
    }
}

/// A triad derived from a pad and a key. Never stored; recomputed on demand so
/// a key change retunes every recorded event.
#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    pub root: PitchClass,
    pub quality: Quality,
    /// Scale degree 0..=7 the chord was built on.
    pub degree: usize,
    pub notes: [u8; 3],
}

impl Chord {
    fn build(key: Key, degree: usize, quality: Quality) -> Self {
        let step = DEGREE_STEPS[degree.min(7)];
        let tonic = key.tonic().semitone();
        let root_midi = BASE_MIDI + tonic + step;
        let [a, b, c] = quality.intervals();

        Self {
            root: PitchClass::from_semitone(tonic + step),
            quality,
            degree: degree.min(7),
            notes: [root_midi + a, root_midi + b, root_midi + c],
        }
    }

    /// Triad on `degree` of the key's major scale with its diatonic quality.
    ///
    /// Degree 6 (the leading tone) is the only source of diminished chords.
    pub fn diatonic(key: Key, degree: usize) -> Self {
        let degree = degree.min(7);
        Self::build(key, degree, DIATONIC[degree])
    }

    pub fn root_midi(&self) -> u8 {
        self.notes[0]
    }

    pub fn frequencies(&self) -> [f32; 3] {
        self.notes.map(|m| mtof(m as f32))
    }

    /// Display symbol: `C`, `F♯m`, `B°`.
    pub fn symbol(&self) -> String {
        let root = self.root.pretty();
        match self.quality {
            Quality::Major => root,
            Quality::Minor => root + "m",
            Quality::Diminished => root + "°",
        }
    }

    /// Plain ASCII label: `C`, `F#m`, `Bdim`.
    pub fn label(&self) -> String {
        let root = self.root.name();
        match self.quality {
            Quality::Major => root.to_string(),
            Quality::Minor => format!("{root}m"),
            Quality::Diminished => format!("{root}dim"),
        }
    }

    /// Note names for a pad caption, e.g. `C - E - G`.
    pub fn note_names(&self) -> String {
        self.notes
            .iter()
            .map(|&m| PitchClass::from_semitone(m).name())
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}

/// Chord for chord pad `pad` (0–15) under `key`.
pub fn chord_for_pad(pad: usize, key: Key) -> Result<Chord> {
    if pad >= CHORD_PADS {
        return Err(Error::PadOutOfRange(pad));
    }
    let quality = if pad >= 8 {
        Quality::Minor
    } else {
        Quality::Major
    };
    Ok(Chord::build(key, pad % 8, quality))
}

/// Reverse lookup used by a circle-of-fifths picker: the pad that plays
/// `root`/`quality` in `key`, if any.
pub fn pad_for_chord(key: Key, root: PitchClass, quality: Quality) -> Option<usize> {
    (0..CHORD_PADS).find(|&pad| {
        chord_for_pad(pad, key)
            .map(|chord| chord.root == root && chord.quality == quality)
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c() -> Key {
        Key(PitchClass::C)
    }

    #[test]
    fn pad_zero_in_c_is_c_major_at_c3() {
        let chord = chord_for_pad(0, c()).unwrap();
        assert_eq!(chord.notes, [48, 52, 55]);
        assert_eq!(chord.label(), "C");
        assert!((chord.frequencies()[0] - 130.81).abs() < 0.01);
    }

    #[test]
    fn pad_eight_in_c_is_c_minor() {
        let chord = chord_for_pad(8, c()).unwrap();
        assert_eq!(chord.quality, Quality::Minor);
        assert_eq!(chord.notes, [48, 51, 55]);
        assert_eq!(chord.note_names(), "C - D# - G");
        assert_eq!(chord.symbol(), "Cm");
    }

    #[test]
    fn octave_pad_does_not_wrap() {
        let chord = chord_for_pad(7, c()).unwrap();
        assert_eq!(chord.root_midi(), 60);
        assert_eq!(chord.root, PitchClass::C);
    }

    #[test]
    fn sharp_spellings_parse_identically() {
        let ascii: Key = "C#".parse().unwrap();
        let pretty: Key = "C♯".parse().unwrap();
        let flat: Key = "Db".parse().unwrap();
        assert_eq!(ascii, pretty);
        assert_eq!(ascii, flat);
        assert!("H".parse::<Key>().is_err());
        assert!("".parse::<Key>().is_err());
    }

    #[test]
    fn key_transposes_root_midi() {
        let key: Key = "F#".parse().unwrap();
        let chord = chord_for_pad(4, key).unwrap();
        // F# + 7 semitones, no wraparound below the tonic.
        assert_eq!(chord.root_midi(), 48 + 6 + 7);
        assert_eq!(chord.root, PitchClass::CSharp);
        assert_eq!(chord.symbol(), "C♯");
    }

    #[test]
    fn pads_out_of_range_are_rejected() {
        assert!(matches!(
            chord_for_pad(16, c()),
            Err(Error::PadOutOfRange(16))
        ));
    }

    #[test]
    fn leading_tone_is_diminished() {
        let chord = Chord::diatonic(c(), 6);
        assert_eq!(chord.quality, Quality::Diminished);
        assert_eq!(chord.notes, [59, 62, 65]);
        assert_eq!(chord.symbol(), "B°");
        assert_eq!(chord.label(), "Bdim");
    }

    #[test]
    fn reverse_lookup_finds_minor_row() {
        assert_eq!(pad_for_chord(c(), PitchClass::A, Quality::Minor), Some(13));
        assert_eq!(pad_for_chord(c(), PitchClass::G, Quality::Major), Some(4));
        assert_eq!(pad_for_chord(c(), PitchClass::B, Quality::Diminished), None);
    }

    #[test]
    fn circle_of_fifths_steps_wrap() {
        assert_eq!(c().step_fifths(1), Key(PitchClass::G));
        assert_eq!(c().step_fifths(-1), Key(PitchClass::F));
        assert_eq!(c().step_fifths(12), c());
    }
}
