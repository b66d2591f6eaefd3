//! Output meters: master level gauge and the FFT spectrum.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType},
    Frame,
};

/// Bottom of the level gauge and the spectrum floor.
const FLOOR_DB: f64 = -60.0;

pub fn render_level(frame: &mut Frame, area: Rect, level_db: f32) {
    let db = (level_db as f64).max(FLOOR_DB);
    let ratio = ((db - FLOOR_DB) / -FLOOR_DB).clamp(0.0, 1.0);
    let color = if db > -3.0 {
        Color::Red
    } else if db > -12.0 {
        Color::Yellow
    } else {
        Color::Green
    };
    let label = if level_db <= FLOOR_DB as f32 {
        "-inf dB".to_string()
    } else {
        format!("{level_db:.1} dB")
    };

    let gauge = Gauge::default()
        .block(Block::default().title(" Level ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

/// Plot `(frequency_hz, magnitude_db)` pairs on a log frequency axis.
pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let points: Vec<(f64, f64)> = spectrum
        .iter()
        .map(|&(freq, db)| (freq.max(1.0).log10(), db.max(FLOOR_DB)))
        .collect();
    let (min_x, max_x) = points
        .first()
        .zip(points.last())
        .map_or((1.0, 4.3), |(lo, hi)| (lo.0, hi.0.max(lo.0 + 0.1)));

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([min_x, max_x])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-60", "-30", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
