//! Pad grid: chord symbols under the current key, drum names, the key that
//! plays each pad and which pads are held.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use powerchord::{engine::AudioHost, session::Session};

use super::keys::PAD_KEYS;

const ROWS: [(&str, std::ops::Range<usize>); 3] =
    [("Major", 0..8), ("Minor", 8..16), ("Drums", 16..24)];

pub fn render_pads<H: AudioHost>(frame: &mut Frame, area: Rect, session: &Session<H>) {
    let block = Block::default().title(" Pads ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::with_capacity(ROWS.len() * 2);
    for (title, pads) in ROWS {
        let mut spans = vec![Span::styled(
            format!("{title:<6}"),
            Style::default().fg(Color::DarkGray),
        )];
        for pad in pads.clone() {
            let label = session.pad_label(pad).unwrap_or_default();
            let style = if session.is_pad_active(pad) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::styled(format!("{:^7.7}", label), style));
        }
        lines.push(Line::from(spans));

        let keys: Vec<Span> = std::iter::once(Span::raw("      "))
            .chain(
                PAD_KEYS[pads]
                    .iter()
                    .map(|k| Span::styled(format!("{k:^7}"), Style::default().fg(Color::DarkGray))),
            )
            .collect();
        lines.push(Line::from(keys));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
