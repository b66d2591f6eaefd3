//! Audio engine: sample clock, voice pool and master bus.
//!
//! The engine is driven one block at a time. Control code never touches it
//! directly; it talks to an [`AudioHost`], which either applies commands on
//! the spot (offline rendering) or queues them to the audio thread
//! ([`live`]). Engine time is the number of rendered frames divided by the
//! sample rate, so every scheduled instant is sample-accurate.

pub mod live;

use rtrb::Consumer;
use tracing::{debug, trace};

use crate::{
    config::EngineConfig,
    mic::MicChain,
    mixer::Mixer,
    synth::{Voice, VoiceId},
    Result, MAX_BLOCK_SIZE,
};

pub use live::{live_engine, LiveEngine, LiveHost, LiveRenderer};

/// Voices reserved up front so typical loads never allocate on the audio
/// thread.
const VOICE_CAPACITY: usize = 256;

/// Control-to-audio messages. Times are engine seconds.
pub enum EngineCommand {
    Start(Box<Voice>),
    Release { voice: VoiceId, at: f64 },
    /// Release every sounding voice with at most `fade` seconds of tail and
    /// drop voices that have not started yet.
    ReleaseAll { at: f64, fade: f64 },
    /// `ReleaseAll` with the panic fade, plus the master mute and restore.
    Panic { at: f64 },
    EnsureAudible { at: f64 },
    SetReverbLevel(f32),
    AttachMic(Consumer<f32>),
    SetMicRoutes(Vec<MicChain>),
}

impl std::fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineCommand::Start(voice) => f
                .debug_struct("Start")
                .field("voice", &voice.id())
                .field("start", &voice.start())
                .finish(),
            EngineCommand::Release { voice, at } => f
                .debug_struct("Release")
                .field("voice", voice)
                .field("at", at)
                .finish(),
            EngineCommand::ReleaseAll { at, fade } => f
                .debug_struct("ReleaseAll")
                .field("at", at)
                .field("fade", fade)
                .finish(),
            EngineCommand::Panic { at } => f.debug_struct("Panic").field("at", at).finish(),
            EngineCommand::EnsureAudible { at } => {
                f.debug_struct("EnsureAudible").field("at", at).finish()
            }
            EngineCommand::SetReverbLevel(level) => {
                f.debug_tuple("SetReverbLevel").field(level).finish()
            }
            EngineCommand::AttachMic(_) => f.write_str("AttachMic"),
            EngineCommand::SetMicRoutes(routes) => {
                f.debug_tuple("SetMicRoutes").field(&routes.len()).finish()
            }
        }
    }
}

/// The control side's view of an engine.
pub trait AudioHost {
    /// Current engine time in seconds.
    fn now(&self) -> f64;

    fn sample_rate(&self) -> f32;

    fn send(&mut self, command: EngineCommand) -> Result<()>;

    /// Output RMS in dBFS.
    fn level_db(&self) -> f32;
}

#[derive(Default)]
struct MicBus {
    input: Option<Consumer<f32>>,
    routes: Vec<MicChain>,
}

/// Voices, buses and the mixer for one output.
pub struct AudioEngine {
    config: EngineConfig,
    sample_rate: f32,
    frame: u64,
    voices: Vec<Voice>,
    mixer: Mixer,
    mic: MicBus,
    dry: Vec<f32>,
    wet: Vec<f32>,
    scratch: Vec<f32>,
    mic_input: Vec<f32>,
}

impl AudioEngine {
    pub fn new(config: &EngineConfig, sample_rate: f32, mixer: Mixer) -> Self {
        Self {
            config: config.clone(),
            sample_rate,
            frame: 0,
            voices: Vec::with_capacity(VOICE_CAPACITY),
            mixer,
            mic: MicBus::default(),
            dry: vec![0.0; MAX_BLOCK_SIZE],
            wet: vec![0.0; MAX_BLOCK_SIZE],
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            mic_input: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Engine for a realtime device at `sample_rate`.
    pub fn live(config: &EngineConfig, sample_rate: f32) -> Self {
        Self::new(config, sample_rate, Mixer::live(config, sample_rate))
    }

    /// Engine for a non-realtime render.
    pub fn offline(config: &EngineConfig, sample_rate: f32) -> Self {
        Self::new(config, sample_rate, Mixer::offline(config, sample_rate))
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn now(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub fn apply(&mut self, command: EngineCommand) {
        trace!(?command, "engine command");
        match command {
            EngineCommand::Start(voice) => {
                if !voice.is_finished() {
                    self.voices.push(*voice);
                }
            }
            EngineCommand::Release { voice, at } => {
                if let Some(v) = self.voices.iter_mut().find(|v| v.id() == voice) {
                    v.release(at, None);
                }
            }
            EngineCommand::ReleaseAll { at, fade } => self.release_all(at, fade),
            EngineCommand::Panic { at } => {
                self.release_all(at, self.config.panic_fade_seconds);
                self.mixer.panic(at);
            }
            EngineCommand::EnsureAudible { at } => self.mixer.ensure_audible(at),
            EngineCommand::SetReverbLevel(level) => self.mixer.set_reverb_level(level),
            EngineCommand::AttachMic(input) => {
                debug!("mic input attached");
                self.mic.input = Some(input);
            }
            EngineCommand::SetMicRoutes(routes) => {
                debug!(routes = routes.len(), "mic routes updated");
                self.mic.routes = routes;
            }
        }
    }

    fn release_all(&mut self, at: f64, fade: f64) {
        self.voices.retain(|voice| voice.start() <= at);
        for voice in &mut self.voices {
            voice.release(at, Some(fade));
        }
    }

    /// Render `left.len()` frames (both channels must match).
    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let total = left.len().min(right.len());
        let mut done = 0;
        while done < total {
            let frames = (total - done).min(MAX_BLOCK_SIZE);
            self.render_chunk(
                &mut left[done..done + frames],
                &mut right[done..done + frames],
            );
            done += frames;
        }
    }

    fn render_chunk(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len();
        let time = self.now();
        let dry = &mut self.dry[..frames];
        let wet = &mut self.wet[..frames];
        dry.fill(0.0);
        wet.fill(0.0);

        for voice in &mut self.voices {
            voice.render(
                self.frame,
                self.sample_rate,
                dry,
                wet,
                &mut self.scratch[..frames],
            );
        }
        self.voices.retain(|voice| !voice.is_finished());

        if let Some(input) = self.mic.input.as_mut() {
            let samples = &mut self.mic_input[..frames];
            for sample in samples.iter_mut() {
                *sample = input.pop().unwrap_or(0.0);
            }
            for route in &mut self.mic.routes {
                route.process(samples, dry, wet);
            }
        }

        self.mixer.process(dry, wet, time, left, right);
        self.frame += frames as u64;
    }

    /// Render `frames` frames into new stereo buffers.
    pub fn render(&mut self, frames: usize) -> [Vec<f32>; 2] {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        self.render_block(&mut left, &mut right);
        [left, right]
    }
}

/// Offline rendering applies commands immediately.
impl AudioHost for AudioEngine {
    fn now(&self) -> f64 {
        AudioEngine::now(self)
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn send(&mut self, command: EngineCommand) -> Result<()> {
        self.apply(command);
        Ok(())
    }

    fn level_db(&self) -> f32 {
        self.mixer.level_db()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        preset::Instrument,
        synth::{chord_voice, drum_voice, ChordRequest, Sends, SynthCtx},
        voices::DrumKind,
        GAIN_FLOOR,
    };

    const SR: f32 = 16_000.0;

    fn engine() -> AudioEngine {
        let config = EngineConfig {
            reverb_seconds: 0.2,
            ..EngineConfig::default()
        };
        AudioEngine::live(&config, SR)
    }

    fn chord(start: f64, length: Option<f64>) -> Box<Voice> {
        let ctx = SynthCtx::new(SR, 0.018);
        Box::new(chord_voice(
            &Instrument::WarmPad.preset(),
            &ChordRequest {
                frequencies: &[261.63, 329.63, 392.0],
                start,
                length,
                velocity: 1.0,
                sends: Sends::new(1.0, 0.0),
                strum: false,
                seed: 1,
            },
            &ctx,
        ))
    }

    fn energy(buffer: &[f32]) -> f32 {
        buffer.iter().map(|x| x * x).sum()
    }

    #[test]
    fn clock_counts_rendered_frames() {
        let mut engine = engine();
        engine.render(4_000);
        assert_eq!(engine.frame(), 4_000);
        assert!((engine.now() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn voice_is_silent_before_its_start() {
        let mut engine = engine();
        engine.apply(EngineCommand::Start(chord(0.5, Some(0.3))));
        let [before, _] = engine.render(7_900);
        assert!(energy(&before) < 1e-9);
        let [after, _] = engine.render(4_000);
        assert!(energy(&after) > 1e-3);
    }

    #[test]
    fn finished_voices_are_reclaimed() {
        let mut engine = engine();
        engine.apply(EngineCommand::Start(chord(0.0, Some(0.1))));
        let ctx = SynthCtx::new(SR, 0.018);
        engine.apply(EngineCommand::Start(Box::new(drum_voice(
            DrumKind::Hat,
            0.0,
            1.0,
            0.0,
            7,
            &ctx,
        ))));
        assert_eq!(engine.voice_count(), 2);
        engine.render(SR as usize * 2);
        assert_eq!(engine.voice_count(), 0);
    }

    #[test]
    fn release_ends_a_held_voice() {
        let mut engine = engine();
        let voice = chord(0.0, None);
        let id = voice.id();
        engine.apply(EngineCommand::Start(voice));
        engine.render(8_000);
        assert_eq!(engine.voice_count(), 1);
        engine.apply(EngineCommand::Release { voice: id, at: 0.5 });
        engine.render(16_000);
        assert_eq!(engine.voice_count(), 0);
    }

    #[test]
    fn release_all_drops_pending_and_fades_the_rest() {
        let mut engine = engine();
        engine.apply(EngineCommand::Start(chord(0.0, None)));
        engine.apply(EngineCommand::Start(chord(5.0, None)));
        engine.render(1_600);
        engine.apply(EngineCommand::ReleaseAll { at: 0.1, fade: 0.05 });
        assert_eq!(engine.voice_count(), 1);
        engine.render(1_600);
        assert_eq!(engine.voice_count(), 0);
    }

    #[test]
    fn panic_silences_voices_and_restores_master_once() {
        let mut engine = engine();
        engine.apply(EngineCommand::Start(chord(0.0, None)));
        engine.render(1_600);
        engine.apply(EngineCommand::Panic { at: 0.1 });
        let [tail, _] = engine.render(1_600);
        assert_eq!(engine.voice_count(), 0);
        // The master is still muted 80 ms after the panic.
        assert!(tail[1_200..].iter().all(|x| x.abs() < 1e-3));
        assert!(engine.mixer().master_at(0.15) <= GAIN_FLOOR * 1.001);
        assert_eq!(engine.mixer().master_at(0.25), 0.78);
        assert_eq!(engine.mixer().restore_count(), 1);
    }
}
