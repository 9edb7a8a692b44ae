use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, unbounded, Sender};

use crate::models::audio_models::EncoderDiagnostics;
use crate::models::config::EncoderConfiguration;
use crate::models::error::EncoderError;
use crate::models::sample_buffer::PcmSampleBuffer;
use crate::session::driver::EncodeDriver;
use crate::traits::codec_candidate::CodecCandidate;
use crate::traits::packet_sink::PacketSink;

type Job = Box<dyn FnOnce(&mut EncodeDriver) + Send + 'static>;

enum LaneMessage {
    Run(Job),
    Shutdown,
}

const LANE_THREAD_NAME: &str = "audio-encode-lane";

/// Cheap, cloneable submitter for capture callbacks.
///
/// Only enqueues; every buffer is processed on the encode lane in the order
/// it was submitted.
#[derive(Clone)]
pub struct EncoderInput {
    sender: Sender<LaneMessage>,
}

impl EncoderInput {
    pub fn encode_sample_buffer(&self, buffer: PcmSampleBuffer) -> Result<(), EncoderError> {
        self.sender
            .send(LaneMessage::Run(Box::new(move |driver: &mut EncodeDriver| {
                driver.encode_sample_buffer(buffer)
            })))
            .map_err(|_| EncoderError::LaneClosed)
    }
}

/// Streaming PCM to AAC encoder.
///
/// All codec state lives on one dedicated thread (the encode lane). Every
/// operation is queued onto it in call order; the mutating ones return as
/// soon as they are queued, the queries wait for the lane to answer.
///
/// ```text
/// capture thread ──encode_sample_buffer──┐
/// app thread ──start/stop/set_bitrate────┼─→ [lane queue] → EncodeDriver → PacketSink
/// app thread ──flush/diagnostics (wait)──┘
/// ```
pub struct AudioEncoder {
    sender: Option<Sender<LaneMessage>>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AudioEncoder {
    /// Spawn the encode lane. Codecs are built lazily from `candidates`, in
    /// order, when the first buffer arrives after `start_running`.
    pub fn new(
        config: EncoderConfiguration,
        candidates: Vec<Box<dyn CodecCandidate>>,
        sink: Arc<dyn PacketSink>,
    ) -> Result<Self, EncoderError> {
        config.validate().map_err(EncoderError::ConfigurationFailed)?;

        let running = Arc::new(AtomicBool::new(false));
        let mut driver = EncodeDriver::new(&config, candidates, sink, Arc::clone(&running));
        let (sender, receiver) = unbounded::<LaneMessage>();

        let handle = thread::Builder::new()
            .name(LANE_THREAD_NAME.into())
            .spawn(move || {
                for message in receiver.iter() {
                    match message {
                        LaneMessage::Run(job) => job(&mut driver),
                        LaneMessage::Shutdown => break,
                    }
                }
                // Release the codec on the lane that owns it.
                driver.stop_running();
                log::debug!("encode lane exited");
            })
            .map_err(|e| {
                EncoderError::ConfigurationFailed(format!("failed to spawn encode lane: {}", e))
            })?;

        Ok(Self {
            sender: Some(sender),
            running,
            handle: Some(handle),
        })
    }

    /// Whether input is currently honored. Read directly, without the lane.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A submitter that capture callbacks can own.
    pub fn input(&self) -> Result<EncoderInput, EncoderError> {
        self.sender
            .clone()
            .map(|sender| EncoderInput { sender })
            .ok_or(EncoderError::LaneClosed)
    }

    pub fn start_running(&self) -> Result<(), EncoderError> {
        self.submit(|driver| driver.start_running())
    }

    /// Queued behind any pending input, so in-flight work drains first.
    pub fn stop_running(&self) -> Result<(), EncoderError> {
        self.submit(|driver| driver.stop_running())
    }

    pub fn invalidate(&self) -> Result<(), EncoderError> {
        self.submit(|driver| driver.invalidate())
    }

    /// Per-channel bitrate in bits per second.
    pub fn set_bitrate(&self, bits_per_second: u32) -> Result<(), EncoderError> {
        self.submit(move |driver| driver.set_bitrate(bits_per_second))
    }

    pub fn set_muted(&self, muted: bool) -> Result<(), EncoderError> {
        self.submit(move |driver| driver.set_muted(muted))
    }

    pub fn encode_sample_buffer(&self, buffer: PcmSampleBuffer) -> Result<(), EncoderError> {
        self.submit(move |driver| driver.encode_sample_buffer(buffer))
    }

    /// Block until everything queued before this call has run.
    pub fn flush(&self) -> Result<(), EncoderError> {
        self.query(|_| ())
    }

    pub fn diagnostics(&self) -> Result<EncoderDiagnostics, EncoderError> {
        self.query(|driver| driver.diagnostics())
    }

    /// Last bitrate the codec accepted, once a codec exists.
    pub fn actual_bitrate(&self) -> Result<Option<u32>, EncoderError> {
        self.query(|driver| driver.actual_bitrate())
    }

    fn submit(&self, job: impl FnOnce(&mut EncodeDriver) + Send + 'static) -> Result<(), EncoderError> {
        let sender = self.sender.as_ref().ok_or(EncoderError::LaneClosed)?;
        sender
            .send(LaneMessage::Run(Box::new(job)))
            .map_err(|_| EncoderError::LaneClosed)
    }

    fn query<R: Send + 'static>(
        &self,
        f: impl FnOnce(&mut EncodeDriver) -> R + Send + 'static,
    ) -> Result<R, EncoderError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.submit(move |driver| {
            let _ = reply_tx.send(f(driver));
        })?;
        reply_rx.recv().map_err(|_| EncoderError::LaneClosed)
    }
}

impl Drop for AudioEncoder {
    fn drop(&mut self) {
        // Outstanding EncoderInput clones may outlive us; stop the lane explicitly.
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(LaneMessage::Shutdown);
        }
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::error!("encode lane panicked");
            }
        }
    }
}
