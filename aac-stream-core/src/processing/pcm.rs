//! PCM sample conversion used by codec backends.
//!
//! Decodes staged buffers of any supported `SourceFormat` into per-channel
//! `f32`, remixes to the destination channel count, and packs interleaved
//! 16-bit samples for encoders that want them.

use crate::models::error::EncoderError;
use crate::models::format::{SampleKind, SourceFormat};
use crate::models::raw_buffer::RawBufferList;

/// Decode `list` into one `Vec<f32>` per channel, normalized to `[-1.0, 1.0]`.
pub fn read_channels(list: &RawBufferList, format: &SourceFormat) -> Result<Vec<Vec<f32>>, EncoderError> {
    if list.len() != format.buffer_count() {
        return Err(EncoderError::InvalidFormat(format!(
            "expected {} buffers, got {}",
            format.buffer_count(),
            list.len()
        )));
    }

    let channels = format.channels as usize;
    let bytes_per_sample = format.bytes_per_sample() as usize;
    let mut out: Vec<Vec<f32>> = vec![Vec::new(); channels];

    if format.interleaved {
        let bytes = list.buffer(0).map(|b| b.bytes()).unwrap_or_default();
        let frame_bytes = bytes_per_sample * channels;
        let frames = bytes.len() / frame_bytes;
        for channel in out.iter_mut() {
            channel.reserve(frames);
        }
        for frame in bytes.chunks_exact(frame_bytes) {
            for (ch, sample) in frame.chunks_exact(bytes_per_sample).enumerate() {
                out[ch].push(decode_sample(sample, format.sample_kind));
            }
        }
    } else {
        for (channel, buffer) in out.iter_mut().zip(list.iter()) {
            channel.extend(
                buffer
                    .bytes()
                    .chunks_exact(bytes_per_sample)
                    .map(|s| decode_sample(s, format.sample_kind)),
            );
        }
    }
    Ok(out)
}

fn decode_sample(bytes: &[u8], kind: SampleKind) -> f32 {
    match (kind, bytes.len()) {
        (SampleKind::SignedInteger, 2) => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32768.0,
        (SampleKind::SignedInteger, 4) => {
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32 / 2_147_483_648.0
        }
        (SampleKind::Float, 4) => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        _ => 0.0,
    }
}

/// Remix per-channel audio to `out_channels`.
///
/// Mono output averages all inputs; mono input is duplicated; otherwise
/// channels are taken in order, wrapping when the source has fewer.
pub fn remix(channels: Vec<Vec<f32>>, out_channels: usize) -> Vec<Vec<f32>> {
    let in_channels = channels.len();
    if in_channels == out_channels || in_channels == 0 || out_channels == 0 {
        return channels;
    }
    if out_channels == 1 {
        return vec![downmix_to_mono(&channels)];
    }
    (0..out_channels)
        .map(|ch| channels[ch % in_channels].clone())
        .collect()
}

/// Average every channel per frame.
pub fn downmix_to_mono(channels: &[Vec<f32>]) -> Vec<f32> {
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    if channels.is_empty() {
        return Vec::new();
    }
    let scale = 1.0 / channels.len() as f32;
    (0..frames)
        .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() * scale)
        .collect()
}

/// Convert `[-1.0, 1.0]` to 16-bit, clamping out-of-range values.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Interleave per-channel audio as 16-bit samples `[L0, R0, L1, R1, ...]`.
pub fn interleave_i16(channels: &[Vec<f32>]) -> Vec<i16> {
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(frames * channels.len());
    for i in 0..frames {
        for channel in channels {
            out.push(f32_to_i16(channel[i]));
        }
    }
    out
}

/// Decode, remix, and interleave `list` as 16-bit samples at `out_channels`.
pub fn to_interleaved_i16(
    list: &RawBufferList,
    format: &SourceFormat,
    out_channels: usize,
) -> Result<Vec<i16>, EncoderError> {
    let channels = read_channels(list, format)?;
    Ok(interleave_i16(&remix(channels, out_channels)))
}
