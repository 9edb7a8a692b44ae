use std::sync::Arc;

use bytes::Bytes;

use super::format::FormatDescriptor;
use super::time::MediaTime;

/// One compressed output unit handed to the downstream writer.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPacket {
    pub data: Bytes,
    pub format: Arc<FormatDescriptor>,
    pub presentation_time: MediaTime,
    /// Duration of a single packet (frames-per-packet at the destination rate).
    pub duration: MediaTime,
    pub packet_count: u32,
    /// Bytes per packet (`data.len() / packet_count`).
    pub sample_size: usize,
    /// Encoder priming to trim at stream start; set only on the first few packets.
    pub trim_duration_at_start: Option<MediaTime>,
}

impl EncodedPacket {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Combined duration of every packet carried.
    pub fn total_duration(&self) -> MediaTime {
        self.duration.scaled(self.packet_count as i64)
    }
}
