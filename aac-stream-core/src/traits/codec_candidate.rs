use crate::models::error::EncoderError;
use crate::models::format::{DestinationFormat, SourceFormat};
use crate::traits::codec::AudioCodec;

/// One way of constructing a codec for a source/destination pair.
///
/// The format negotiator tries candidates in order and keeps the first that builds.
pub trait CodecCandidate: Send {
    fn name(&self) -> &str;

    fn build(
        &self,
        source: &SourceFormat,
        destination: &DestinationFormat,
    ) -> Result<Box<dyn AudioCodec>, EncoderError>;
}
