use thiserror::Error;

/// Errors produced by the encoder core and its collaborators.
///
/// Codec-level failures are absorbed inside the encode lane; only session
/// lifecycle calls surface these to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncoderError {
    /// The codec refused a property value (e.g. an unsupported bitrate).
    #[error("codec rejected {property} = {value}: {reason}")]
    ConfigurationRejected {
        property: &'static str,
        value: u32,
        reason: String,
    },

    #[error("no codec implementation available: {0}")]
    CodecUnavailable(String),

    #[error("encode failed: {0}")]
    EncodeFailed(String),

    #[error("invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    /// Returned by a `CaptureSource` whose platform refused microphone access.
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("encode lane is not running")]
    LaneClosed,
}

impl EncoderError {
    pub fn rejected(property: &'static str, value: u32, reason: impl Into<String>) -> Self {
        Self::ConfigurationRejected {
            property,
            value,
            reason: reason.into(),
        }
    }
}
