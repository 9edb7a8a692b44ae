use bytes::Bytes;

use super::error::EncoderError;
use super::format::{SampleKind, SourceFormat};
use super::time::MediaTime;

/// A timestamped chunk of PCM as delivered by the capture source.
///
/// Interleaved formats carry one plane; planar formats carry one plane per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmSampleBuffer {
    format: SourceFormat,
    presentation_time: MediaTime,
    frame_count: u32,
    planes: Vec<Bytes>,
}

impl PcmSampleBuffer {
    pub fn interleaved(
        format: SourceFormat,
        presentation_time: MediaTime,
        data: impl Into<Bytes>,
    ) -> Result<Self, EncoderError> {
        if !format.interleaved {
            return Err(EncoderError::InvalidFormat(
                "interleaved buffer with planar format".into(),
            ));
        }
        Self::planar(format, presentation_time, vec![data.into()])
    }

    /// Builds a buffer from per-buffer planes; every plane must hold the same whole number of frames.
    pub fn planar(
        format: SourceFormat,
        presentation_time: MediaTime,
        planes: Vec<Bytes>,
    ) -> Result<Self, EncoderError> {
        format.validate()?;
        if planes.len() != format.buffer_count() {
            return Err(EncoderError::InvalidFormat(format!(
                "expected {} planes, got {}",
                format.buffer_count(),
                planes.len()
            )));
        }
        let plane_len = planes[0].len();
        if planes.iter().any(|p| p.len() != plane_len) {
            return Err(EncoderError::InvalidFormat("planes differ in length".into()));
        }
        let bpf = format.bytes_per_frame as usize;
        if plane_len % bpf != 0 {
            return Err(EncoderError::InvalidFormat(format!(
                "plane length {} is not a multiple of {} bytes per frame",
                plane_len, bpf
            )));
        }
        Ok(Self {
            format,
            presentation_time,
            frame_count: (plane_len / bpf) as u32,
            planes,
        })
    }

    /// Packs interleaved float samples into a buffer of the matching float format.
    pub fn from_f32_interleaved(
        samples: &[f32],
        sample_rate: f64,
        channels: u16,
        presentation_time: MediaTime,
    ) -> Result<Self, EncoderError> {
        let format = SourceFormat::interleaved_f32(sample_rate, channels as u32);
        let mut data = Vec::with_capacity(samples.len() * 4);
        for sample in samples {
            data.extend_from_slice(&sample.to_le_bytes());
        }
        Self::interleaved(format, presentation_time, data)
    }

    /// A buffer of digital silence in `format`.
    pub fn silence(
        format: SourceFormat,
        presentation_time: MediaTime,
        frame_count: u32,
    ) -> Result<Self, EncoderError> {
        let plane_len = frame_count as usize * format.bytes_per_frame as usize;
        let planes = (0..format.buffer_count())
            .map(|_| Bytes::from(vec![0u8; plane_len]))
            .collect();
        Self::planar(format, presentation_time, planes)
    }

    pub fn format(&self) -> &SourceFormat {
        &self.format
    }

    pub fn presentation_time(&self) -> MediaTime {
        self.presentation_time
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn planes(&self) -> &[Bytes] {
        &self.planes
    }

    /// Total PCM bytes across all planes.
    pub fn data_len(&self) -> usize {
        self.planes.iter().map(Bytes::len).sum()
    }

    pub fn is_float(&self) -> bool {
        self.format.sample_kind == SampleKind::Float
    }
}
