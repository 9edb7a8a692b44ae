use super::format::SourceFormat;
use super::state::EncodePhase;

/// Transport type for a capture device.
///
/// Reported by `CaptureSource::device_info` implementations; the core only
/// passes it through to `ConversionSession::available_audio_sources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioTransportType {
    BuiltIn,
    Bluetooth,
    Usb,
    Virtual,
    Unknown,
}

/// A capture device backing a `CaptureSource`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub transport_type: Option<AudioTransportType>,
}

/// Counters for debugging the encode lane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncoderDiagnostics {
    pub buffers_received: u64,
    pub buffers_dropped: u64,
    pub passes: u64,
    pub packets_emitted: u64,
    pub transient_errors: u64,
    pub requested_bitrate: u32,
    pub actual_bitrate: Option<u32>,
    pub phase: EncodePhase,
    pub codec_name: Option<String>,
    pub source_format: Option<SourceFormat>,
}
