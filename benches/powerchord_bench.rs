//! Benchmarks for the realtime path.
//!
//! Run with: cargo bench
//!
//! Reference timing at 48kHz sample rate:
//!   - 128 samples = 2.67ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - engine/chords  One held chord per instrument, block render
//!   - engine/drums   A full kit hit, block render
//!   - mixer/bus      Reverb, compressor and master gain over a block

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use powerchord::{
    config::{EngineConfig, SchedulerConfig},
    engine::{AudioEngine, EngineCommand},
    mixer::Mixer,
    preset::Instrument,
    synth::{chord_voice, drum_voice, ChordRequest, Sends, SynthCtx},
    theory::{chord_for_pad, Key},
    voices::DrumKind,
};

const SAMPLE_RATE: f32 = 48_000.0;
const BLOCK_SIZES: &[usize] = &[128, 512];

fn bench_chords(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/chords");
    let config = EngineConfig::default();
    let ctx = SynthCtx::new(SAMPLE_RATE, SchedulerConfig::default().strum_step_seconds);
    let Ok(chord) = chord_for_pad(0, Key::default()) else {
        return;
    };
    let frequencies = chord.frequencies();

    for instrument in Instrument::ALL {
        if matches!(instrument, Instrument::DrumKit | Instrument::Microphone) {
            continue;
        }
        for &size in BLOCK_SIZES {
            let mut engine = AudioEngine::offline(&config, SAMPLE_RATE);
            let request = ChordRequest {
                frequencies: &frequencies,
                start: 0.0,
                length: None,
                velocity: 1.0,
                sends: Sends::new(1.0, 0.22),
                strum: false,
                seed: 7,
            };
            let voice = chord_voice(&instrument.preset(), &request, &ctx);
            engine.apply(EngineCommand::Start(Box::new(voice)));
            let mut left = vec![0.0f32; size];
            let mut right = vec![0.0f32; size];

            group.bench_with_input(BenchmarkId::new(instrument.id(), size), &size, |b, _| {
                b.iter(|| engine.render_block(black_box(&mut left), black_box(&mut right)))
            });
        }
    }

    group.finish();
}

fn bench_drums(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/drums");
    let config = EngineConfig::default();
    let ctx = SynthCtx::new(SAMPLE_RATE, SchedulerConfig::default().strum_step_seconds);

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];
        group.bench_with_input(BenchmarkId::new("kit", size), &size, |b, _| {
            b.iter_batched(
                || {
                    let mut engine = AudioEngine::offline(&config, SAMPLE_RATE);
                    for (seed, kind) in DrumKind::ALL.into_iter().enumerate() {
                        let voice = drum_voice(kind, 0.0, 0.8, 0.2, seed as u64, &ctx);
                        engine.apply(EngineCommand::Start(Box::new(voice)));
                    }
                    engine
                },
                |mut engine| engine.render_block(black_box(&mut left), black_box(&mut right)),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_mixer(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixer/bus");
    let config = EngineConfig::default();

    for &size in BLOCK_SIZES {
        let mut mixer = Mixer::offline(&config, SAMPLE_RATE);
        let dry: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let wet = dry.clone();
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];
        let mut time = 0.0;

        group.bench_with_input(BenchmarkId::new("process", size), &size, |b, &size| {
            b.iter(|| {
                mixer.process(
                    black_box(&dry),
                    black_box(&wet),
                    time,
                    &mut left,
                    &mut right,
                );
                time += size as f64 / SAMPLE_RATE as f64;
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_chords, bench_drums, bench_mixer);
criterion_main!(benches);
