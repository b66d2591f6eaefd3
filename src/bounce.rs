//! Offline render of one loop to a WAV file.
//!
//! The bounce replays a snapshot of the event store through the same
//! scheduler, voice builders and mixer chain as live playback, driving the
//! engine clock by hand instead of from a device callback.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    config::{EngineConfig, SchedulerConfig},
    engine::{AudioEngine, EngineCommand},
    io::write_wav_16bit,
    sequencer::{voices_for, Dispatch, EventStore, LoopScheduler, Transport},
    synth::SynthCtx,
    theory::Key,
    Result,
};

pub const BOUNCE_SAMPLE_RATE: u32 = 44_100;

/// What to bounce: the arrangement and the musical settings it plays under.
#[derive(Debug, Clone, Copy)]
pub struct BounceSettings {
    pub bpm: f64,
    pub bars: u32,
    pub key: Key,
    pub safe_mode: bool,
    /// Reverb return level for the wet bus.
    pub reverb_level: f32,
}

/// Frames in one loop at the bounce rate.
pub fn loop_frames(transport: &Transport) -> usize {
    let exact = transport.loop_seconds() * BOUNCE_SAMPLE_RATE as f64;
    // 2.4 s * 44100 must not round up to an extra frame.
    (exact - 1e-6).ceil() as usize
}

/// Poll the scheduler across one loop at the bounce rate, one poll interval
/// at a time. `step` receives each poll's dispatches, the store they refer
/// to and the number of frames to advance before the next poll.
fn drive_loop(
    store: &EventStore,
    settings: &BounceSettings,
    scheduler_config: &SchedulerConfig,
    mut step: impl FnMut(&[Dispatch], &EventStore, &Transport, usize),
) -> Result<()> {
    let mut store = store.clone();
    store.reset_guards();
    let mut transport = Transport::new(settings.bpm, settings.bars)?;
    transport.start(0.0);

    let scheduler = LoopScheduler::new(scheduler_config.clone());
    let sample_rate = BOUNCE_SAMPLE_RATE as f64;
    let total = loop_frames(&transport);
    let interval =
        ((scheduler_config.poll_interval_seconds * sample_rate).round() as usize).max(1);
    let mut dispatches = Vec::new();
    let mut done = 0;

    while done < total {
        dispatches.clear();
        let now = done as f64 / sample_rate;
        scheduler.poll(&transport, &mut store, now, &mut dispatches);
        let frames = interval.min(total - done);
        step(&dispatches, &store, &transport, frames);
        done += frames;
    }
    Ok(())
}

/// Every occurrence the bounce of `store` dispatches, in dispatch order.
pub fn loop_dispatches(
    store: &EventStore,
    settings: &BounceSettings,
    scheduler_config: &SchedulerConfig,
) -> Result<Vec<Dispatch>> {
    let mut all = Vec::new();
    drive_loop(store, settings, scheduler_config, |dispatches, _, _, _| {
        all.extend_from_slice(dispatches);
    })?;
    Ok(all)
}

/// Render exactly one loop of `store` to stereo buffers.
pub fn render_loop(
    store: &EventStore,
    settings: &BounceSettings,
    engine_config: &EngineConfig,
    scheduler_config: &SchedulerConfig,
) -> Result<[Vec<f32>; 2]> {
    let sample_rate = BOUNCE_SAMPLE_RATE as f32;
    let mut engine = AudioEngine::offline(engine_config, sample_rate);
    engine.apply(EngineCommand::SetReverbLevel(settings.reverb_level));
    let mut ctx = SynthCtx::new(sample_rate, scheduler_config.strum_step_seconds);
    ctx.safe_mode = settings.safe_mode;

    let mut left = Vec::new();
    let mut right = Vec::new();
    drive_loop(
        store,
        settings,
        scheduler_config,
        |dispatches, store, transport, frames| {
            for voice in voices_for(dispatches, store, transport, settings.key, &ctx) {
                engine.apply(EngineCommand::Start(Box::new(voice)));
            }
            let [l, r] = engine.render(frames);
            left.extend_from_slice(&l);
            right.extend_from_slice(&r);
        },
    )?;

    Ok([left, right])
}

/// `powerchord-bounce-YYYY-MM-DD-HH-MM-SS.wav`
pub fn bounce_file_name(at: DateTime<Utc>) -> String {
    format!("powerchord-bounce-{}.wav", at.format("%Y-%m-%d-%H-%M-%S"))
}

/// Render one loop and write it into `dir`. Returns the file path.
pub fn bounce_to_dir(
    dir: &Path,
    store: &EventStore,
    settings: &BounceSettings,
    engine_config: &EngineConfig,
    scheduler_config: &SchedulerConfig,
) -> Result<PathBuf> {
    let [left, right] = render_loop(store, settings, engine_config, scheduler_config)?;
    let path = dir.join(bounce_file_name(Utc::now()));
    write_wav_16bit(&path, &[&left, &right], BOUNCE_SAMPLE_RATE)?;
    info!(path = %path.display(), frames = left.len(), "bounce written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn settings(bars: u32) -> BounceSettings {
        BounceSettings {
            bpm: 100.0,
            bars,
            key: Key::default(),
            safe_mode: true,
            reverb_level: 1.0,
        }
    }

    fn short_reverb() -> EngineConfig {
        EngineConfig {
            reverb_seconds: 0.2,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn file_name_uses_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        assert_eq!(
            bounce_file_name(at),
            "powerchord-bounce-2024-03-09-07-05-02.wav"
        );
    }

    #[test]
    fn empty_store_renders_silence_of_one_loop() {
        let [left, right] = render_loop(
            &EventStore::new(),
            &settings(1),
            &short_reverb(),
            &SchedulerConfig::default(),
        )
        .unwrap();
        assert_eq!(left.len(), 105_840);
        assert_eq!(right.len(), left.len());
        assert!(left.iter().all(|x| x.abs() < 1e-6));
    }

    #[test]
    fn recorded_events_are_audible() {
        let mut store = EventStore::new();
        let track = store.add_track(None);
        store.push_event(track, 1.0, 0, 1.0, 4.0).unwrap();
        let [left, _] = render_loop(
            &store,
            &settings(1),
            &short_reverb(),
            &SchedulerConfig::default(),
        )
        .unwrap();

        // Beat 1 at 100 bpm is 0.6 s.
        let onset = (0.6 * BOUNCE_SAMPLE_RATE as f64) as usize;
        assert!(left[..onset - 100].iter().all(|x| x.abs() < 1e-6));
        assert!(left[onset..onset + 4410].iter().any(|x| x.abs() > 1e-2));
    }

    #[test]
    fn muted_and_mic_tracks_stay_out() {
        let mut store = EventStore::new();
        let muted = store.add_track(None);
        let mic = store.add_track(None);
        store.push_event(muted, 0.0, 0, 1.0, 4.0).unwrap();
        store.push_event(mic, 0.0, 0, 1.0, 4.0).unwrap();
        store.track_mut(muted).unwrap().muted = true;
        store
            .track_mut(mic)
            .unwrap()
            .set_role(crate::sequencer::Role::Mic);

        let [left, right] = render_loop(
            &store,
            &settings(1),
            &short_reverb(),
            &SchedulerConfig::default(),
        )
        .unwrap();
        assert!(left.iter().chain(&right).all(|x| x.abs() < 1e-6));
    }

    #[test]
    fn source_store_is_untouched() {
        let mut store = EventStore::new();
        let track = store.add_track(None);
        let event = store.push_event(track, 0.0, 3, 1.0, 4.0).unwrap();
        render_loop(
            &store,
            &settings(1),
            &short_reverb(),
            &SchedulerConfig::default(),
        )
        .unwrap();
        assert_eq!(store.track(track).unwrap().last_scheduled(event), None);
    }
}
