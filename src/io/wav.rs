//! WAV file writer
//!
//! 16-bit little-endian PCM with channels interleaved, written through
//! `hound`. For one or two channels that is the canonical 44-byte header.
//! Samples are clamped to [-1, 1]; negative values scale by 32768 and
//! positive values by 32767 so both ends of the range are reached.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::Result;

/// 16-bit integer PCM at `sample_rate`.
pub fn pcm16_spec(channels: u16, sample_rate: u32) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

#[inline]
fn to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Interleave planar channels into `writer` and finalize the header.
///
/// Every channel should have the same length; extra frames in longer
/// channels are ignored.
fn write_frames<W: Write + Seek>(
    mut writer: WavWriter<W>,
    channels: &[&[f32]],
) -> Result<()> {
    let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    for frame in 0..frames {
        for channel in channels {
            writer.write_sample(to_i16(channel[frame]))?;
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Encode planar channels into a complete WAV byte image.
pub fn encode_wav_16bit(channels: &[&[f32]], sample_rate: u32) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let spec = pcm16_spec(channels.len() as u16, sample_rate);
    write_frames(WavWriter::new(&mut cursor, spec)?, channels)?;
    Ok(cursor.into_inner())
}

/// Write planar channels to `path` as a 16-bit PCM WAV file.
pub fn write_wav_16bit(
    path: impl AsRef<Path>,
    channels: &[&[f32]],
    sample_rate: u32,
) -> Result<()> {
    let spec = pcm16_spec(channels.len() as u16, sample_rate);
    let writer: WavWriter<BufWriter<File>> = WavWriter::create(path, spec)?;
    write_frames(writer, channels)
}
