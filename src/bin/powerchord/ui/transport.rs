//! Transport bar widget - shows tempo, key, loop position and audio status

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use powerchord::session::{AudioStatus, SessionStatus};

pub fn render_transport(frame: &mut Frame, area: Rect, status: &SessionStatus, reverb: f32) {
    let block = Block::default().title(" powerchord ").borders(Borders::ALL);

    let (symbol, state, color) = match (status.playing, status.recording) {
        (_, true) => ("●", "Record", Color::Red),
        (true, false) => ("▶", "Play", Color::Green),
        (false, false) => ("■", "Stopped", Color::Yellow),
    };

    let position = match status.position {
        Some(pos) => format!(
            "Bar {}/{} | Beat {:.1}  ",
            pos.bar + 1,
            status.bars,
            pos.beat % 4.0 + 1.0
        ),
        None => format!("Bar -/{}  ", status.bars),
    };

    let chord = status
        .last_chord
        .as_ref()
        .map_or_else(|| "-".to_string(), |c| c.symbol());

    let audio_color = match status.audio {
        AudioStatus::MicUnavailable => Color::Red,
        AudioStatus::Recording | AudioStatus::On => Color::DarkGray,
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {symbol} {state}  "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("BPM: {:.0}  ", status.bpm),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Key: {}  ", status.key),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(position, Style::default().fg(Color::White)),
        Span::styled(
            format!("Last: {chord}  "),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("Events: {}  Rev: {:.0}%  ", status.events, reverb * 100.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(status.audio.label(), Style::default().fg(audio_color)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
