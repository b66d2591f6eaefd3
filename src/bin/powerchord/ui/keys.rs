//! Keyboard layout.
//!
//! Three rows of letter keys are the pads: the home row plays the major
//! chords, the row above the minor chords and the row below the drums.
//! Commands use keys outside those rows, or their shifted letters.

use crossterm::event::KeyCode;

use powerchord::sequencer::DrumPattern;

/// Key for each pad, in pad order.
pub const PAD_KEYS: [char; 24] = [
    'a', 's', 'd', 'f', 'g', 'h', 'j', 'k', // major row
    'q', 'w', 'e', 'r', 't', 'y', 'u', 'i', // minor row
    'z', 'x', 'c', 'v', 'b', 'n', 'm', ',', // drums
];

pub const HELP: &str = " [Space] Play/Stop  [R] Rec  [P] Panic  [B] Bounce  [ [ ] ] Key  \
[-/=] BPM  [1-5] Bars  [Tab] Arm  [F1-F11] Track/FX  [PgUp/PgDn] Reverb  [Esc] Quit";

pub fn pad_for_key(code: KeyCode) -> Option<usize> {
    match code {
        KeyCode::Char(c) => PAD_KEYS.iter().position(|&k| k == c),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Quit,
    PlayStop,
    Record,
    Panic,
    Bounce,
    /// Steps around the circle of fifths.
    KeyStep(i32),
    Tempo(f64),
    /// Index into the supported bar counts.
    Bars(usize),
    ArmNext,
    AddTrack,
    CycleRole,
    CycleInstrument,
    ToggleStrum,
    ToggleMute,
    ClearTrack,
    ClearAll,
    Pattern(DrumPattern),
    Reverb(f32),
    SafeMode,
    MicMonitor,
}

impl Command {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        let command = match code {
            KeyCode::Esc => Command::Quit,
            KeyCode::Char(' ') => Command::PlayStop,
            KeyCode::Char('R') => Command::Record,
            KeyCode::Char('p') | KeyCode::Char('P') => Command::Panic,
            KeyCode::Char('B') => Command::Bounce,
            KeyCode::Char('[') => Command::KeyStep(-1),
            KeyCode::Char(']') => Command::KeyStep(1),
            KeyCode::Char('-') => Command::Tempo(-1.0),
            KeyCode::Char('=') => Command::Tempo(1.0),
            KeyCode::Char('_') => Command::Tempo(-10.0),
            KeyCode::Char('+') => Command::Tempo(10.0),
            KeyCode::Char(c @ '1'..='5') => Command::Bars(c as usize - '1' as usize),
            KeyCode::Tab => Command::ArmNext,
            KeyCode::F(1) => Command::AddTrack,
            KeyCode::F(2) => Command::CycleRole,
            KeyCode::F(3) => Command::CycleInstrument,
            KeyCode::F(4) => Command::ToggleStrum,
            KeyCode::F(5) => Command::ToggleMute,
            KeyCode::F(6) => Command::ClearTrack,
            KeyCode::F(7) => Command::ClearAll,
            KeyCode::F(8) => Command::Pattern(DrumPattern::Rock),
            KeyCode::F(9) => Command::Pattern(DrumPattern::HipHop),
            KeyCode::F(10) => Command::SafeMode,
            KeyCode::F(11) => Command::MicMonitor,
            KeyCode::PageUp => Command::Reverb(0.1),
            KeyCode::PageDown => Command::Reverb(-0.1),
            _ => return None,
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pad_has_a_distinct_key() {
        for (pad, &key) in PAD_KEYS.iter().enumerate() {
            assert_eq!(pad_for_key(KeyCode::Char(key)), Some(pad));
            assert!(Command::from_key(KeyCode::Char(key)).is_none());
        }
    }

    #[test]
    fn number_keys_pick_bar_counts() {
        assert_eq!(Command::from_key(KeyCode::Char('1')), Some(Command::Bars(0)));
        assert_eq!(Command::from_key(KeyCode::Char('5')), Some(Command::Bars(4)));
        assert_eq!(Command::from_key(KeyCode::Char('6')), None);
    }
}
