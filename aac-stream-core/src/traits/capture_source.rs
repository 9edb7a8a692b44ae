use std::sync::Arc;

use crate::models::audio_models::AudioSource;
use crate::models::error::EncoderError;
use crate::models::sample_buffer::PcmSampleBuffer;

/// Callback invoked for every captured PCM buffer.
///
/// Fires on the capture source's own thread; the session only enqueues the
/// buffer onto the encode lane from here.
pub type SampleBufferCallback = Arc<dyn Fn(PcmSampleBuffer) + Send + Sync + 'static>;

/// Platform capture graph delivering timestamped PCM.
pub trait CaptureSource: Send {
    /// Whether this source can currently deliver audio.
    fn is_available(&self) -> bool;

    /// Start capturing, delivering buffers via `callback`.
    fn start(&mut self, callback: SampleBufferCallback) -> Result<(), EncoderError>;

    /// Stop capturing. No callbacks may fire after this returns.
    fn stop(&mut self) -> Result<(), EncoderError>;

    fn device_info(&self) -> AudioSource;
}
