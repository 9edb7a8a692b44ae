use bytes::Bytes;

use crate::models::error::EncoderError;
use crate::models::format::AacTransport;
use crate::models::raw_buffer::RawBufferList;

/// Answer to one codec request for more input.
#[derive(Debug, PartialEq, Eq)]
pub enum PullStatus<'a> {
    /// Exactly one packet of input. The data is only valid until the next pull.
    Packet(&'a RawBufferList),
    /// Nothing left for this pass. Not an error: it ends the pass.
    Exhausted,
}

impl PullStatus<'_> {
    /// Input packets reported to the codec (0 or 1).
    pub fn packet_count(&self) -> u32 {
        match self {
            Self::Packet(_) => 1,
            Self::Exhausted => 0,
        }
    }
}

/// Supplies input to a codec on demand.
///
/// Implemented by the pull adapter; codecs call it from inside `fill`.
pub trait InputProvider {
    fn pull_input(&mut self) -> PullStatus<'_>;
}

/// Outcome of one `AudioCodec::fill` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    /// `n` packets were written to the output buffer list.
    Packets(u32),
    /// Input ran out before a packet could be produced. Ends the pass.
    NoMoreInput,
}

/// A stateful compression engine driven by pulling input.
///
/// One instance per running interval; it is owned by the encode lane and
/// never touched from any other thread.
pub trait AudioCodec: Send {
    /// Human readable implementation name for diagnostics.
    fn name(&self) -> &str;

    /// Produce up to `max_packets` packets into `output`, pulling input from
    /// `input` as needed. The codec sets the valid length of `output`'s first
    /// buffer to the number of bytes written.
    fn fill(
        &mut self,
        input: &mut dyn InputProvider,
        max_packets: u32,
        output: &mut RawBufferList,
    ) -> Result<FillStatus, EncoderError>;

    /// Set the total target bitrate in bits per second.
    ///
    /// Returns `ConfigurationRejected` when the value is not supported.
    fn set_bitrate(&mut self, bits_per_second: u32) -> Result<(), EncoderError>;

    fn transport(&self) -> AacTransport {
        AacTransport::Raw
    }

    /// Codec-specific configuration (AudioSpecificConfig) for the container.
    fn magic_cookie(&self) -> Option<Bytes> {
        None
    }
}
