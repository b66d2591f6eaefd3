//! Realtime split of the engine.
//!
//! [`LiveRenderer`] owns the [`AudioEngine`] and lives inside the device
//! callback. [`LiveHost`] stays on the control thread and reaches it through
//! a lock-free `rtrb` queue. The renderer publishes its frame counter and
//! output level through atomics, and pushes a mono copy of the output into a
//! scope ring for the spectrum display.

use std::sync::{
    atomic::{AtomicU32, AtomicU64, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, RingBuffer};

use super::{AudioEngine, AudioHost, EngineCommand};
use crate::{config::EngineConfig, Error, Result, MAX_BLOCK_SIZE};

/// Mono samples kept for the display side.
pub const SCOPE_CAPACITY: usize = 8192;

#[derive(Debug, Default)]
struct Shared {
    frame: AtomicU64,
    level_db: AtomicU32,
}

/// Control-thread handle.
pub struct LiveHost {
    commands: Producer<EngineCommand>,
    shared: Arc<Shared>,
    sample_rate: f32,
}

impl AudioHost for LiveHost {
    fn now(&self) -> f64 {
        self.shared.frame.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn send(&mut self, command: EngineCommand) -> Result<()> {
        self.commands.push(command).map_err(|_| Error::QueueFull)
    }

    fn level_db(&self) -> f32 {
        f32::from_bits(self.shared.level_db.load(Ordering::Relaxed))
    }
}

/// Audio-thread half.
pub struct LiveRenderer {
    engine: AudioEngine,
    commands: Consumer<EngineCommand>,
    shared: Arc<Shared>,
    scope: Producer<f32>,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl LiveRenderer {
    pub fn sample_rate(&self) -> f32 {
        self.engine.sample_rate()
    }

    /// Fill an interleaved device buffer. The first two channels get left
    /// and right; any further channels repeat the left channel, and a mono
    /// device gets the average.
    pub fn process_interleaved(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let total = data.len() / channels;
        let mut written = 0;

        while written < total {
            let frames = (total - written).min(MAX_BLOCK_SIZE);
            self.drain_commands();

            let left = &mut self.left[..frames];
            let right = &mut self.right[..frames];
            self.engine.render_block(left, right);

            let out = &mut data[written * channels..(written + frames) * channels];
            for (i, frame) in out.chunks_exact_mut(channels).enumerate() {
                let (l, r) = (left[i], right[i]);
                match frame {
                    [mono] => *mono = 0.5 * (l + r),
                    [a, b, rest @ ..] => {
                        *a = l;
                        *b = r;
                        rest.fill(l);
                    }
                    [] => {}
                }
                if !self.scope.is_full() {
                    let _ = self.scope.push(0.5 * (l + r));
                }
            }

            written += frames;
            self.publish();
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            self.engine.apply(command);
        }
    }

    fn publish(&self) {
        self.shared
            .frame
            .store(self.engine.frame(), Ordering::Release);
        self.shared
            .level_db
            .store(self.engine.mixer().level_db().to_bits(), Ordering::Relaxed);
    }
}

/// Everything `live_engine` hands out.
pub struct LiveEngine {
    pub host: LiveHost,
    pub renderer: LiveRenderer,
    /// Mono output for the spectrum display.
    pub scope: Consumer<f32>,
}

/// Build a live engine at the device's sample rate.
pub fn live_engine(config: &EngineConfig, sample_rate: f32) -> LiveEngine {
    let (command_tx, command_rx) = RingBuffer::new(config.command_capacity.max(1));
    let (scope_tx, scope_rx) = RingBuffer::new(SCOPE_CAPACITY);
    let shared = Arc::new(Shared::default());
    shared
        .level_db
        .store((-120.0f32).to_bits(), Ordering::Relaxed);

    LiveEngine {
        host: LiveHost {
            commands: command_tx,
            shared: Arc::clone(&shared),
            sample_rate,
        },
        renderer: LiveRenderer {
            engine: AudioEngine::live(config, sample_rate),
            commands: command_rx,
            shared,
            scope: scope_tx,
            left: vec![0.0; MAX_BLOCK_SIZE],
            right: vec![0.0; MAX_BLOCK_SIZE],
        },
        scope: scope_rx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        preset::Instrument,
        synth::{chord_voice, ChordRequest, Sends, SynthCtx},
    };

    fn small_config() -> EngineConfig {
        EngineConfig {
            reverb_seconds: 0.1,
            command_capacity: 4,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn clock_follows_rendered_frames() {
        let LiveEngine {
            host,
            mut renderer,
            ..
        } = live_engine(&small_config(), 8_000.0);
        assert_eq!(host.now(), 0.0);
        let mut data = vec![0.0; 800 * 2];
        renderer.process_interleaved(&mut data, 2);
        assert!((host.now() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn commands_reach_the_renderer() {
        let LiveEngine {
            mut host,
            mut renderer,
            mut scope,
        } = live_engine(&small_config(), 8_000.0);
        let ctx = SynthCtx::new(8_000.0, 0.018);
        let voice = chord_voice(
            &Instrument::BrightSynth.preset(),
            &ChordRequest {
                frequencies: &[220.0],
                start: 0.0,
                length: Some(0.2),
                velocity: 1.0,
                sends: Sends::new(1.0, 0.0),
                strum: false,
                seed: 0,
            },
            &ctx,
        );
        host.send(EngineCommand::Start(Box::new(voice))).unwrap();

        let mut data = vec![0.0; 400 * 2];
        renderer.process_interleaved(&mut data, 2);
        assert!(data.iter().any(|x| x.abs() > 1e-3));
        assert_eq!(scope.slots(), 400);
        assert!(host.level_db() > -120.0);
        while scope.pop().is_ok() {}
    }

    #[test]
    fn full_queue_reports_an_error() {
        let LiveEngine { mut host, .. } = live_engine(&small_config(), 8_000.0);
        for _ in 0..4 {
            host.send(EngineCommand::SetReverbLevel(0.5)).unwrap();
        }
        assert!(matches!(
            host.send(EngineCommand::SetReverbLevel(0.5)),
            Err(Error::QueueFull)
        ));
    }

    #[test]
    fn mono_device_gets_the_average() {
        let LiveEngine { mut renderer, .. } = live_engine(&small_config(), 8_000.0);
        let mut data = vec![1.0; 256];
        renderer.process_interleaved(&mut data, 1);
        assert!(data.iter().all(|x| x.abs() < 1e-3));
    }
}
