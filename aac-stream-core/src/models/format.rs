use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::EncoderError;
use super::time::MediaTime;
use crate::processing::adts;

/// AAC-LC frames per access unit.
pub const AAC_FRAMES_PER_PACKET: u32 = 1024;

/// MPEG-4 audio object type for AAC Low Complexity.
pub const AAC_LC_OBJECT_TYPE: u8 = 2;

/// Destination rate used when neither configuration nor source supplies one.
pub const DEFAULT_DESTINATION_SAMPLE_RATE: u32 = 44_100;

/// Numeric encoding of one PCM sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    SignedInteger,
    Float,
}

/// Layout of the PCM delivered by the capture source.
///
/// `bytes_per_frame` describes one frame within one buffer: for interleaved
/// data that spans every channel, for planar data it is a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceFormat {
    pub sample_rate: f64,
    pub channels: u32,
    pub bits_per_channel: u32,
    pub sample_kind: SampleKind,
    pub interleaved: bool,
    pub bytes_per_frame: u32,
}

impl SourceFormat {
    pub fn new(
        sample_rate: f64,
        channels: u32,
        bits_per_channel: u32,
        sample_kind: SampleKind,
        interleaved: bool,
    ) -> Self {
        let bytes_per_sample = bits_per_channel / 8;
        let bytes_per_frame = if interleaved {
            bytes_per_sample * channels
        } else {
            bytes_per_sample
        };
        Self {
            sample_rate,
            channels,
            bits_per_channel,
            sample_kind,
            interleaved,
            bytes_per_frame,
        }
    }

    /// Packed signed 16-bit, the usual microphone format.
    pub fn interleaved_i16(sample_rate: f64, channels: u32) -> Self {
        Self::new(sample_rate, channels, 16, SampleKind::SignedInteger, true)
    }

    pub fn interleaved_f32(sample_rate: f64, channels: u32) -> Self {
        Self::new(sample_rate, channels, 32, SampleKind::Float, true)
    }

    pub fn planar_f32(sample_rate: f64, channels: u32) -> Self {
        Self::new(sample_rate, channels, 32, SampleKind::Float, false)
    }

    /// Number of separate buffers one chunk of this format occupies.
    pub fn buffer_count(&self) -> usize {
        if self.interleaved {
            1
        } else {
            self.channels as usize
        }
    }

    /// Channels carried by each buffer.
    pub fn channels_per_buffer(&self) -> u32 {
        if self.interleaved {
            self.channels
        } else {
            1
        }
    }

    pub fn bytes_per_sample(&self) -> u32 {
        self.bits_per_channel / 8
    }

    /// True when a buffer in `other` can be staged into storage sized for `self`.
    pub fn same_geometry(&self, other: &SourceFormat) -> bool {
        self.channels == other.channels
            && self.interleaved == other.interleaved
            && self.bytes_per_frame == other.bytes_per_frame
            && self.bits_per_channel == other.bits_per_channel
            && self.sample_kind == other.sample_kind
    }

    pub fn validate(&self) -> Result<(), EncoderError> {
        if self.sample_rate.is_nan() || self.sample_rate <= 0.0 {
            return Err(EncoderError::InvalidFormat(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.channels == 0 {
            return Err(EncoderError::InvalidFormat("zero channels".into()));
        }
        let supported = matches!(
            (self.sample_kind, self.bits_per_channel),
            (SampleKind::SignedInteger, 16)
                | (SampleKind::SignedInteger, 32)
                | (SampleKind::Float, 32)
        );
        if !supported {
            return Err(EncoderError::InvalidFormat(format!(
                "unsupported sample layout: {:?} {} bits",
                self.sample_kind, self.bits_per_channel
            )));
        }
        let expected = self.bytes_per_sample() * self.channels_per_buffer();
        if self.bytes_per_frame != expected {
            return Err(EncoderError::InvalidFormat(format!(
                "bytes per frame {} does not match layout (expected {})",
                self.bytes_per_frame, expected
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatId {
    Mpeg4Aac,
}

/// Target compression parameters. Fixed for the lifetime of a running interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationFormat {
    pub sample_rate: u32,
    pub channels: u32,
    pub frames_per_packet: u32,
    pub format_id: FormatId,
    pub object_type: u8,
}

impl DestinationFormat {
    pub fn aac_lc(sample_rate: u32, channels: u32) -> Self {
        Self {
            sample_rate,
            channels,
            frames_per_packet: AAC_FRAMES_PER_PACKET,
            format_id: FormatId::Mpeg4Aac,
            object_type: AAC_LC_OBJECT_TYPE,
        }
    }

    /// Duration of one compressed packet.
    pub fn packet_duration(&self) -> MediaTime {
        MediaTime::new(self.frames_per_packet as i64, self.sample_rate as i32)
    }

    /// `frames` expressed in the destination timescale.
    pub fn frames(&self, frames: u32) -> MediaTime {
        MediaTime::new(frames as i64, self.sample_rate as i32)
    }
}

/// How each compressed packet is framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AacTransport {
    /// Bare access units; the container carries the AudioSpecificConfig.
    Raw,
    /// Every access unit carries its own 7-byte ADTS header.
    Adts,
}

/// Output format descriptor shared by every packet of one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub destination: DestinationFormat,
    pub transport: AacTransport,
    pub magic_cookie: Option<Bytes>,
}

impl FormatDescriptor {
    pub fn new(destination: DestinationFormat, transport: AacTransport) -> Self {
        Self {
            destination,
            transport,
            magic_cookie: None,
        }
    }

    pub fn with_magic_cookie(mut self, cookie: Option<Bytes>) -> Self {
        self.magic_cookie = cookie.filter(|c| !c.is_empty());
        self
    }

    /// The codec-supplied cookie, or a generated 2-byte AudioSpecificConfig.
    pub fn audio_specific_config(&self) -> Option<Bytes> {
        if let Some(ref cookie) = self.magic_cookie {
            return Some(cookie.clone());
        }
        adts::audio_specific_config(
            self.destination.object_type,
            self.destination.sample_rate,
            self.destination.channels,
        )
        .map(|asc| Bytes::copy_from_slice(&asc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_geometry() {
        let f = SourceFormat::interleaved_i16(44100.0, 2);
        assert_eq!(f.bytes_per_frame, 4);
        assert_eq!(f.buffer_count(), 1);
        assert_eq!(f.channels_per_buffer(), 2);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn planar_geometry() {
        let f = SourceFormat::planar_f32(48000.0, 2);
        assert_eq!(f.bytes_per_frame, 4);
        assert_eq!(f.buffer_count(), 2);
        assert_eq!(f.channels_per_buffer(), 1);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn rejects_bad_formats() {
        assert!(SourceFormat::interleaved_i16(0.0, 2).validate().is_err());
        assert!(SourceFormat::interleaved_i16(44100.0, 0).validate().is_err());
        let odd = SourceFormat::new(44100.0, 1, 24, SampleKind::SignedInteger, true);
        assert!(odd.validate().is_err());
        let mut lying = SourceFormat::interleaved_i16(44100.0, 2);
        lying.bytes_per_frame = 3;
        assert!(lying.validate().is_err());
    }

    #[test]
    fn geometry_ignores_sample_rate() {
        let a = SourceFormat::interleaved_i16(44100.0, 2);
        let b = SourceFormat::interleaved_i16(48000.0, 2);
        let c = SourceFormat::interleaved_i16(44100.0, 1);
        assert!(a.same_geometry(&b));
        assert!(!a.same_geometry(&c));
    }

    #[test]
    fn packet_duration_is_frames_over_rate() {
        let d = DestinationFormat::aac_lc(44100, 1);
        assert_eq!(d.packet_duration(), MediaTime::new(1024, 44100));
    }

    #[test]
    fn descriptor_prefers_codec_cookie() {
        let d = DestinationFormat::aac_lc(44100, 1);
        let generated = FormatDescriptor::new(d, AacTransport::Raw);
        assert_eq!(generated.audio_specific_config().unwrap().as_ref(), &[0x12, 0x08]);

        let cookie = Bytes::from_static(&[0xAB, 0xCD]);
        let supplied = generated.clone().with_magic_cookie(Some(cookie.clone()));
        assert_eq!(supplied.audio_specific_config(), Some(cookie));

        let empty = generated.with_magic_cookie(Some(Bytes::new()));
        assert!(empty.magic_cookie.is_none());
    }
}
