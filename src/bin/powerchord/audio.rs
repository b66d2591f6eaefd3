//! cpal glue: the output stream that runs the engine and the input device
//! mic tracks read from.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, RingBuffer};
use tracing::{error, info, warn};

use powerchord::{
    config::EngineConfig,
    engine::{live_engine, LiveEngine, LiveHost},
    mic::InputDevice,
    Error,
};

/// Mic samples buffered between the input callback and the engine.
const MIC_CAPACITY: usize = 16_384;

/// A running output stream and the handles the control side needs.
pub struct Output {
    /// Dropping the stream stops audio.
    pub stream: cpal::Stream,
    pub host: LiveHost,
    pub scope: Consumer<f32>,
    pub sample_rate: f32,
}

/// Open the default output device and start rendering into it.
pub fn start_output(config: &EngineConfig) -> EyreResult<Output> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let device_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = device_config.sample_rate().0 as f32;
    let channels = device_config.channels() as usize;
    info!(
        device = device.name().unwrap_or_default(),
        sample_rate, channels, "opening output"
    );

    let LiveEngine {
        host: live_host,
        mut renderer,
        scope,
    } = live_engine(config, sample_rate);

    let stream = device
        .build_output_stream(
            &device_config.into(),
            move |data: &mut [f32], _| renderer.process_interleaved(data, channels),
            |err| error!(%err, "audio output error"),
            None,
        )
        .wrap_err("failed to build output stream")?;
    stream.play().wrap_err("failed to start output stream")?;

    Ok(Output {
        stream,
        host: live_host,
        scope,
        sample_rate,
    })
}

/// Default input device, opened on first request and downmixed to mono.
///
/// The engine reads mic samples at its own rate; devices whose input rate
/// differs from the output rate will play back pitched.
#[derive(Default)]
pub struct CpalInput {
    stream: Option<cpal::Stream>,
}

impl InputDevice for CpalInput {
    fn open(&mut self) -> powerchord::Result<Consumer<f32>> {
        let unavailable = |err: &dyn std::fmt::Display| Error::MicUnavailable(err.to_string());

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::MicUnavailable("no default input device".to_string()))?;
        let config = device
            .default_input_config()
            .map_err(|err| unavailable(&err))?;
        let channels = (config.channels() as usize).max(1);

        let (mut tx, rx) = RingBuffer::new(MIC_CAPACITY);
        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _| {
                    for frame in data.chunks(channels) {
                        let mono = frame.iter().sum::<f32>() / channels as f32;
                        if tx.push(mono).is_err() {
                            break;
                        }
                    }
                },
                |err| warn!(%err, "audio input error"),
                None,
            )
            .map_err(|err| unavailable(&err))?;
        stream.play().map_err(|err| unavailable(&err))?;

        self.stream = Some(stream);
        Ok(rx)
    }
}
