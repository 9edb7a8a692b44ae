use std::path::PathBuf;

use crate::models::error::EncoderError;
use crate::models::format::FormatDescriptor;
use crate::models::packet::EncodedPacket;
use crate::models::time::MediaTime;

/// The muxer that turns encoded packets into a file.
pub trait ContainerWriter: Send {
    /// Open the output and begin the timeline at `start_time`.
    fn start_session(
        &mut self,
        format: &FormatDescriptor,
        start_time: MediaTime,
    ) -> Result<(), EncoderError>;

    /// Real-time writers may ask the caller to drop data while they catch up.
    fn is_ready_for_more_data(&self) -> bool {
        true
    }

    fn append(&mut self, packet: &EncodedPacket) -> Result<(), EncoderError>;

    /// Flush, close, and return where the artifact was written.
    fn finish(&mut self) -> Result<PathBuf, EncoderError>;

    fn bytes_written(&self) -> u64;
}
