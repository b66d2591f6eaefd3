//! PowerChord - application builder and runner

use std::path::PathBuf;

use color_eyre::eyre::Result as EyreResult;
use tracing::info;

use powerchord::{
    config::{EngineConfig, SchedulerConfig},
    session::Session,
};

use super::audio::{start_output, CpalInput};
use super::ui::UiApp;

/// Main application builder
pub struct PowerChord {
    engine: EngineConfig,
    scheduler: SchedulerConfig,
    bounce_dir: PathBuf,
}

impl PowerChord {
    pub fn new() -> Self {
        Self {
            engine: EngineConfig::default(),
            scheduler: SchedulerConfig::default(),
            bounce_dir: std::env::var_os("POWERCHORD_BOUNCE_DIR")
                .map_or_else(|| PathBuf::from("."), PathBuf::from),
        }
    }

    /// Starting tempo in beats per minute
    pub fn bpm(mut self, bpm: f64) -> Self {
        self.scheduler.default_bpm = bpm;
        self
    }

    /// Starting loop length in bars
    pub fn bars(mut self, bars: u32) -> Self {
        self.scheduler.default_bars = bars;
        self
    }

    /// Open audio, take over the terminal and run until quit.
    pub fn run(self) -> EyreResult<()> {
        let output = start_output(&self.engine)?;
        let session = Session::new(output.host, self.engine, self.scheduler)
            .with_input(Box::new(CpalInput::default()));

        let mut app = UiApp::new(session, output.scope, output.sample_rate, self.bounce_dir);
        let mut terminal = ratatui::init();
        let result = app.run(&mut terminal);
        ratatui::restore();

        drop(output.stream);
        info!("shut down");
        result
    }
}

impl Default for PowerChord {
    fn default() -> Self {
        Self::new()
    }
}
