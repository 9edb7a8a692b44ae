use crate::models::error::EncoderError;

/// Process-wide audio session (category, preferred rate) owned by the host.
///
/// Injected into the conversion session so the encoder core never touches
/// global audio configuration itself.
pub trait AudioSession: Send + Sync {
    fn activate(&self) -> Result<(), EncoderError>;

    fn deactivate(&self) -> Result<(), EncoderError>;
}
