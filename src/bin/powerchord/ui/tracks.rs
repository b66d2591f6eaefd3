//! Track list with a per-track event lane and the loop playhead.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use powerchord::{
    sequencer::{EventStore, Track},
    session::SessionStatus,
};

/// Width taken by the name/role columns before the lane.
const LABEL_WIDTH: u16 = 26;

pub fn render_tracks(frame: &mut Frame, area: Rect, store: &EventStore, status: &SessionStatus) {
    let block = Block::default().title(" Tracks ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if store.is_empty() {
        frame.render_widget(
            Paragraph::new(" No tracks yet - press a pad or F1")
                .style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let lane_width = inner.width.saturating_sub(LABEL_WIDTH).max(8) as usize;
    let loop_beats = (status.bars * 4) as f64;
    let playhead = status
        .position
        .map(|p| ((p.fraction * lane_width as f64) as usize).min(lane_width - 1));

    let lines: Vec<Line> = store
        .tracks()
        .iter()
        .map(|track| {
            let armed = status.armed == Some(track.id());
            track_line(track, armed, lane(track, loop_beats, lane_width, playhead))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn track_line(track: &Track, armed: bool, lane: String) -> Line<'static> {
    let marker = if armed { "●" } else { " " };
    let mut name_style = Style::default().fg(if track.muted {
        Color::DarkGray
    } else {
        Color::White
    });
    if armed {
        name_style = name_style.add_modifier(Modifier::BOLD);
    }
    let flags = format!(
        "{}{}",
        if track.muted { "M" } else { " " },
        if track.strum() { "S" } else { " " }
    );

    Line::from(vec![
        Span::styled(format!("{marker} "), Style::default().fg(Color::Red)),
        Span::styled(format!("{:<9.9}", track.name), name_style),
        Span::styled(
            format!("{:<6}", track.role().label()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{flags} "), Style::default().fg(Color::Yellow)),
        Span::styled(lane, Style::default().fg(Color::Green)),
    ])
}

/// One character per lane cell: `█` where an event sounds, `|` at the
/// playhead, `·` on beat lines.
fn lane(track: &Track, loop_beats: f64, width: usize, playhead: Option<usize>) -> String {
    let mut cells = vec![' '; width];
    let beat_cells = width as f64 / loop_beats;
    for beat in 0..loop_beats as usize {
        let cell = (beat as f64 * beat_cells) as usize;
        if cell < width {
            cells[cell] = '·';
        }
    }
    for event in track.events() {
        let start = (event.offset() * beat_cells) as usize;
        let end = ((event.offset() + event.duration()) * beat_cells).ceil() as usize;
        for cell in start..end.max(start + 1) {
            cells[cell % width] = '█';
        }
    }
    if let Some(cell) = playhead {
        cells[cell] = '|';
    }
    cells.into_iter().collect()
}
