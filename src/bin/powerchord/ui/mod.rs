//! TUI module for powerchord
//!
//! Keyboard pads, transport controls and the live displays.

mod keys;
mod pads;
mod spectrum;
mod tracks;
mod transport;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use tracing::warn;

use powerchord::{
    dsp::analysis::SpectrumAnalyzer,
    engine::{AudioHost, LiveHost},
    preset::Instrument,
    sequencer::{Role, SUPPORTED_BARS},
    session::{PadHandle, PointerId, Session},
    Result,
};

use keys::{pad_for_key, Command};
use pads::render_pads;
use spectrum::{render_level, render_spectrum};
use tracks::render_tracks;
use transport::render_transport;

/// Samples analysed per spectrum frame
const FFT_SIZE: usize = 2048;

/// Terminals only report key presses, so a pad is let go this long after
/// the last press or auto-repeat of its key.
const KEY_HOLD: Duration = Duration::from_millis(120);

struct HeldKey {
    handle: PadHandle,
    until: Instant,
}

/// UI application state
pub struct UiApp {
    session: Session<LiveHost>,
    /// Mono output tap from the audio thread
    scope_rx: Consumer<f32>,
    scope: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    held: HashMap<usize, HeldKey>,
    poll_interval: Duration,
    last_tick: Instant,
    bounce_dir: PathBuf,
    message: Option<String>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        session: Session<LiveHost>,
        scope_rx: Consumer<f32>,
        sample_rate: f32,
        bounce_dir: PathBuf,
    ) -> Self {
        let poll_interval = Duration::from_secs_f64(session.scheduler_config().poll_interval_seconds);
        Self {
            session,
            scope_rx,
            scope: vec![0.0; FFT_SIZE],
            spectrum: SpectrumAnalyzer::new(FFT_SIZE, sample_rate, 0.6),
            held: HashMap::new(),
            poll_interval,
            last_tick: Instant::now(),
            bounce_dir,
            message: None,
            should_quit: false,
        }
    }

    /// Run the UI event loop. The session is ticked from here, so the
    /// keyboard poll timeout is kept below the scheduler interval.
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            if self.last_tick.elapsed() >= self.poll_interval {
                self.last_tick = Instant::now();
                self.session.tick();
            }
            self.release_expired();
            self.poll_scope();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(10))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        stop_on_quit(&mut self.session);
        Ok(())
    }

    fn poll_scope(&mut self) {
        let mut fresh = 0;
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
            fresh += 1;
        }
        if self.scope.len() > FFT_SIZE {
            let excess = self.scope.len() - FFT_SIZE;
            self.scope.drain(0..excess);
        }
        if fresh > 0 {
            self.spectrum.update(&self.scope);
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        if let Some(pad) = pad_for_key(code) {
            self.press_pad(pad);
            return;
        }
        let Some(command) = Command::from_key(code) else {
            return;
        };
        if let Err(err) = self.run_command(command) {
            warn!(?command, %err, "command failed");
            self.message = Some(err.to_string());
        }
    }

    fn press_pad(&mut self, pad: usize) {
        let until = Instant::now() + KEY_HOLD;
        if let Some(held) = self.held.get_mut(&pad) {
            held.until = until;
            return;
        }
        match self.session.on_pad_press(pad, PointerId(pad as u64)) {
            Ok(handle) => {
                self.held.insert(pad, HeldKey { handle, until });
            }
            Err(err) => self.message = Some(err.to_string()),
        }
    }

    fn release_expired(&mut self) {
        let now = Instant::now();
        let expired: Vec<usize> = self
            .held
            .iter()
            .filter(|(_, held)| held.until <= now)
            .map(|(&pad, _)| pad)
            .collect();
        for pad in expired {
            if let Some(held) = self.held.remove(&pad) {
                if let Err(err) = self.session.on_pad_release(held.handle) {
                    self.message = Some(err.to_string());
                }
            }
        }
    }

    fn run_command(&mut self, command: Command) -> Result<()> {
        self.message = None;
        let session = &mut self.session;
        match command {
            Command::Quit => self.should_quit = true,
            Command::PlayStop => {
                if session.transport().is_playing() {
                    session.stop_transport()?;
                } else {
                    session.start_transport()?;
                }
            }
            Command::Record => {
                session.toggle_record()?;
            }
            Command::Panic => session.panic()?,
            Command::Bounce => {
                let path = session.bounce(&self.bounce_dir)?;
                self.message = Some(format!("bounced to {}", path.display()));
            }
            Command::KeyStep(steps) => {
                let key = session.key().step_fifths(steps);
                session.set_key(key);
            }
            Command::Tempo(delta) => {
                let bpm = session.transport().bpm() + delta;
                session.set_bpm(bpm);
            }
            Command::Bars(index) => {
                if let Some(&bars) = SUPPORTED_BARS.get(index) {
                    session.set_bar_count(bars)?;
                }
            }
            Command::ArmNext => {
                session.arm_next_track();
            }
            Command::AddTrack => {
                let track = session.add_track(None);
                session.arm_track(track)?;
            }
            Command::CycleRole => {
                if let Some(track) = session.store().armed_track() {
                    let (id, role) = (track.id(), track.role());
                    let next = Role::ALL
                        .iter()
                        .position(|&r| r == role)
                        .map_or(0, |i| (i + 1) % Role::ALL.len());
                    session.set_track_role(id, Role::ALL[next])?;
                }
            }
            Command::CycleInstrument => {
                if let Some(track) = session.store().armed_track() {
                    let id = track.id();
                    let next = next_instrument(track.instrument());
                    session.set_track_instrument(id, next)?;
                }
            }
            Command::ToggleStrum => {
                if let Some(track) = session.store().armed_track() {
                    let (id, strum) = (track.id(), track.strum());
                    session.set_track_strum(id, !strum)?;
                }
            }
            Command::ToggleMute => {
                if let Some(id) = session.store().armed() {
                    session.toggle_mute(id)?;
                }
            }
            Command::ClearTrack => {
                if let Some(id) = session.store().armed() {
                    session.clear_track(id)?;
                }
            }
            Command::ClearAll => session.clear_all(),
            Command::Pattern(pattern) => {
                session.apply_drum_pattern(pattern)?;
            }
            Command::Reverb(delta) => {
                let level = session.reverb_level() + delta;
                session.set_reverb_level(level)?;
            }
            Command::SafeMode => {
                let safe = !session.is_safe_mode();
                session.set_safe_mode(safe);
            }
            Command::MicMonitor => {
                let on = !session.mic_monitor();
                session.set_mic_monitor(on);
            }
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let status = self.session.status();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Transport bar
                Constraint::Min(8),     // Tracks and pads
                Constraint::Length(3),  // Level meter
                Constraint::Length(10), // Spectrum
                Constraint::Length(1),  // Help / message
            ])
            .split(area);

        render_transport(frame, chunks[0], &status, self.session.reverb_level());

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);
        render_tracks(frame, middle[0], self.session.store(), &status);
        render_pads(frame, middle[1], &self.session);

        render_level(frame, chunks[2], status.level_db);
        render_spectrum(frame, chunks[3], self.spectrum.data());

        let (text, color) = match &self.message {
            Some(message) => (format!(" {message}"), Color::Yellow),
            None => (keys::HELP.to_string(), Color::DarkGray),
        };
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(color)),
            chunks[4],
        );
    }
}

/// Stop playback on the way out. A failure is logged; quitting goes ahead.
fn stop_on_quit<H: AudioHost>(session: &mut Session<H>) {
    if let Err(err) = session.stop_transport() {
        warn!(%err, "failed to stop transport on quit");
    }
}

/// Next instrument a chord track can play, wrapping around.
fn next_instrument(current: Instrument) -> Instrument {
    let melodic: Vec<Instrument> = Instrument::ALL
        .into_iter()
        .filter(|i| !matches!(i, Instrument::DrumKit | Instrument::Microphone))
        .collect();
    let next = melodic
        .iter()
        .position(|&i| i == current)
        .map_or(0, |i| (i + 1) % melodic.len());
    melodic[next]
}
