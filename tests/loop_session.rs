use powerchord::{
    config::{EngineConfig, SchedulerConfig},
    engine::AudioEngine,
    sequencer::{quantize, EventStore, Role},
    session::{PointerId, Session},
    theory::CHORD_PADS,
};

const SAMPLE_RATE: f32 = 8_000.0;
const TICK: f64 = 0.035;

fn session() -> Session<AudioEngine> {
    let config = EngineConfig {
        reverb_seconds: 0.1,
        ..EngineConfig::default()
    };
    let engine = AudioEngine::live(&config, SAMPLE_RATE);
    Session::new(engine, config, SchedulerConfig::default())
}

/// Tick and render for `ticks` control intervals.
fn run(session: &mut Session<AudioEngine>, ticks: usize) {
    for _ in 0..ticks {
        session.tick();
        session
            .host_mut()
            .render((TICK * SAMPLE_RATE as f64) as usize);
    }
}

#[test]
fn recorded_chord_replays_on_the_next_cycle() {
    let mut s = session();
    s.set_bpm(120.0);
    s.set_bar_count(1).unwrap();
    assert!(s.toggle_record().unwrap());

    // 15 ticks is 0.525 s, beat 1.05, which quantizes to beat 1.
    run(&mut s, 15);
    let handle = s.on_pad_press(0, PointerId(1)).unwrap();
    run(&mut s, 14);
    s.on_pad_release(handle).unwrap();
    assert!(!s.toggle_record().unwrap());

    let track = &s.store().tracks()[0];
    assert_eq!(track.events().len(), 1);
    let event = &track.events()[0];
    assert_eq!(event.offset(), 1.0);
    assert!((event.duration() - 1.0).abs() <= 0.25);
    let id = event.id();

    // Next cycle starts at 2 s; beat 5 sounds at 2.5 s.
    run(&mut s, 70);
    assert_eq!(s.store().tracks()[0].last_scheduled(id), Some(5.0));
    assert!(s.status().position.is_some());
}

#[test]
fn drum_pad_records_onto_a_drum_track() {
    let mut s = session();
    s.toggle_record().unwrap();
    let handle = s.on_pad_press(CHORD_PADS + 1, PointerId(2)).unwrap();
    s.on_pad_release(handle).unwrap();

    let drums: Vec<_> = s
        .store()
        .tracks()
        .iter()
        .filter(|t| t.role() == Role::Drums)
        .collect();
    assert_eq!(drums.len(), 1);
    assert_eq!(drums[0].events().len(), 1);
    assert_eq!(drums[0].events()[0].pad(), 1);
}

#[test]
fn shrinking_the_loop_folds_events() {
    let mut store = EventStore::new();
    let track = store.add_track(None);
    let late = store.push_event(track, 13.0, 2, 6.0, 16.0).unwrap();
    let early = store.push_event(track, 18.0, 4, 1.0, 16.0).unwrap();

    let events = store.track(track).unwrap();
    assert_eq!(events.event(early).unwrap().offset(), 2.0);

    store.fold(8.0);
    let events = store.track(track).unwrap();
    assert_eq!(events.event(late).unwrap().offset(), 5.0);
    assert_eq!(events.event(late).unwrap().duration(), 6.0);
    assert_eq!(events.event(early).unwrap().offset(), 2.0);
}

#[test]
fn quantize_is_idempotent() {
    for beat in [0.0, 0.12, 0.13, 1.49, 3.874, 7.999, 12.6] {
        let once = quantize(beat, 0.25);
        assert_eq!(quantize(once, 0.25), once);
        assert!((once - beat).abs() <= 0.125 + 1e-9);
    }
}

#[test]
fn panic_silences_and_restores_once() {
    let mut s = session();
    s.start_transport().unwrap();
    s.on_pad_press(4, PointerId(3)).unwrap();
    run(&mut s, 3);

    s.panic().unwrap();
    assert!(!s.transport().is_playing());
    assert!(!s.is_pad_active(4));

    let mixer = s.host().mixer();
    assert_eq!(mixer.restore_count(), 1);
    let now = s.host().now();
    assert!(mixer.master_at(now + 0.05) < 0.01);
    assert_eq!(mixer.master_at(now + 0.5), mixer.master_default());

    run(&mut s, 30);
    assert_eq!(s.host().voice_count(), 0);
    assert_eq!(s.host().mixer().restore_count(), 1);
}
