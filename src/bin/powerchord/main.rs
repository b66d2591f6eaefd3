//! powerchord - terminal chord sequencer
//!
//! Run with: cargo run --release

mod app;
mod audio;
mod ui;

use std::fs::File;
use std::sync::Mutex;

use app::PowerChord;
use color_eyre::eyre::WrapErr;
use tracing_subscriber::EnvFilter;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // The TUI owns the terminal, so logs go to a file.
    let log = File::create("powerchord.log").wrap_err("failed to create powerchord.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    PowerChord::new().bpm(100.0).bars(4).run()
}
