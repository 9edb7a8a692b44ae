use aac_stream_core::models::config::DEFAULT_BITRATE;
use aac_stream_core::models::error::EncoderError;
use aac_stream_core::models::format::{AacTransport, DestinationFormat, SourceFormat};
use aac_stream_core::traits::codec::AudioCodec;
use aac_stream_core::traits::codec_candidate::CodecCandidate;

use crate::codec::FdkAacCodec;

/// Builds `FdkAacCodec`s with a fixed output transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdkAacCandidate {
    transport: AacTransport,
}

impl FdkAacCandidate {
    /// Bare access units with an AudioSpecificConfig cookie.
    pub fn raw() -> Self {
        Self {
            transport: AacTransport::Raw,
        }
    }

    /// Self-describing ADTS frames.
    pub fn adts() -> Self {
        Self {
            transport: AacTransport::Adts,
        }
    }

    pub fn transport(&self) -> AacTransport {
        self.transport
    }
}

impl CodecCandidate for FdkAacCandidate {
    fn name(&self) -> &str {
        match self.transport {
            AacTransport::Raw => "fdk-aac (raw)",
            AacTransport::Adts => "fdk-aac (adts)",
        }
    }

    fn build(
        &self,
        source: &SourceFormat,
        destination: &DestinationFormat,
    ) -> Result<Box<dyn AudioCodec>, EncoderError> {
        // The bitrate controller settles the real value right after construction.
        let bitrate = DEFAULT_BITRATE * destination.channels.max(1);
        let codec = FdkAacCodec::new(self.name(), *source, *destination, self.transport, bitrate)?;
        Ok(Box::new(codec))
    }
}

/// Preferred raw candidate first, ADTS as the fallback.
pub fn default_candidates() -> Vec<Box<dyn CodecCandidate>> {
    vec![Box::new(FdkAacCandidate::raw()), Box::new(FdkAacCandidate::adts())]
}
