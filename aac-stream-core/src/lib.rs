//! # aac-stream-core
//!
//! Streaming PCM to AAC encoder core.
//!
//! Takes variably sized, timestamped PCM buffers from a capture source,
//! drives a pull-based codec one buffer at a time on a dedicated encode lane,
//! and emits timed AAC packets with priming annotations to a container
//! writer. Codec backends implement `CodecCandidate` / `AudioCodec` and plug
//! into the format negotiator.
//!
//! ## Architecture
//!
//! ```text
//! aac-stream-core (this crate)
//! ├── traits/       ← AudioCodec, InputProvider, CodecCandidate, PacketSink,
//! │                   CaptureSource, ContainerWriter, SessionDelegate, AudioSession
//! ├── models/       ← EncoderError, formats, MediaTime, RawBufferList, packets, config, state
//! ├── processing/   ← buffer pool, pull adapter, bitrate controller, format negotiator,
//! │                   priming, PCM conversion, ADTS framing
//! ├── session/      ← EncodeDriver, AudioEncoder (encode lane), ConversionSession
//! └── storage/      ← AdtsFileWriter, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioSource, AudioTransportType, EncoderDiagnostics};
pub use models::config::{EncoderConfiguration, SessionConfiguration};
pub use models::error::EncoderError;
pub use models::format::{AacTransport, DestinationFormat, FormatDescriptor, SampleKind, SourceFormat};
pub use models::packet::EncodedPacket;
pub use models::raw_buffer::{RawBuffer, RawBufferList};
pub use models::sample_buffer::PcmSampleBuffer;
pub use models::session_result::{SessionMetadata, SessionResult, StreamStats};
pub use models::state::{EncodePhase, SessionState};
pub use models::time::MediaTime;
pub use processing::bitrate::{BitrateController, BitrateState};
pub use processing::buffer_pool::RawBufferPool;
pub use processing::format_negotiator::FormatNegotiator;
pub use processing::priming::PrimingPolicy;
pub use processing::pull_adapter::{PendingInput, PullAdapter};
pub use session::conversion::{ConversionSession, WriterSink};
pub use session::driver::EncodeDriver;
pub use session::lane::{AudioEncoder, EncoderInput};
pub use storage::adts_writer::AdtsFileWriter;
pub use traits::audio_session::AudioSession;
pub use traits::capture_source::{CaptureSource, SampleBufferCallback};
pub use traits::codec::{AudioCodec, FillStatus, InputProvider, PullStatus};
pub use traits::codec_candidate::CodecCandidate;
pub use traits::container_writer::ContainerWriter;
pub use traits::packet_sink::PacketSink;
pub use traits::session_delegate::SessionDelegate;
