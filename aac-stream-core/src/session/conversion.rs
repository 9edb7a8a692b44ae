use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::models::audio_models::{AudioSource, EncoderDiagnostics};
use crate::models::config::SessionConfiguration;
use crate::models::error::EncoderError;
use crate::models::packet::EncodedPacket;
use crate::models::sample_buffer::PcmSampleBuffer;
use crate::models::session_result::{SessionMetadata, SessionResult, StreamStats};
use crate::models::state::SessionState;
use crate::session::lane::AudioEncoder;
use crate::storage::metadata;
use crate::traits::audio_session::AudioSession;
use crate::traits::capture_source::{CaptureSource, SampleBufferCallback};
use crate::traits::codec_candidate::CodecCandidate;
use crate::traits::container_writer::ContainerWriter;
use crate::traits::packet_sink::PacketSink;
use crate::traits::session_delegate::SessionDelegate;

/// Writer-side state, touched from the encode lane and from `finish`.
struct WriterState<W> {
    writer: Option<W>,
    skip_remaining: u32,
    session_started: bool,
    hasher: Sha256,
    stats: StreamStats,
    packets_skipped: u64,
    packets_not_ready: u64,
    error: Option<EncoderError>,
}

impl<W> WriterState<W> {
    fn new() -> Self {
        Self {
            writer: None,
            skip_remaining: 0,
            session_started: false,
            hasher: Sha256::new(),
            stats: StreamStats::default(),
            packets_skipped: 0,
            packets_not_ready: 0,
            error: None,
        }
    }
}

/// Packet sink that feeds a `ContainerWriter`.
///
/// Drops the configured warm-up packets, opens the writer timeline at the first
/// kept packet, makes sure that packet carries a trim annotation, and keeps a
/// running SHA-256 of everything appended.
pub struct WriterSink<W: ContainerWriter> {
    state: Mutex<WriterState<W>>,
}

impl<W: ContainerWriter> WriterSink<W> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(WriterState::new()),
        }
    }

    /// Install a fresh writer for the next session.
    pub fn reset(&self, writer: W, skip_leading_packets: u32) {
        let mut state = self.state.lock();
        *state = WriterState::new();
        state.writer = Some(writer);
        state.skip_remaining = skip_leading_packets;
    }

    pub fn stats(&self) -> StreamStats {
        self.state.lock().stats.clone()
    }

    /// Packets discarded as warm-up or because the writer was busy.
    pub fn packets_discarded(&self) -> u64 {
        let state = self.state.lock();
        state.packets_skipped + state.packets_not_ready
    }

    /// Finalize the writer. Returns the artifact location, checksum, and totals.
    pub fn finish(&self, bitrate: u32) -> Result<(PathBuf, String, StreamStats), EncoderError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let mut writer = state
            .writer
            .take()
            .ok_or_else(|| EncoderError::StorageError("no writer installed".into()))?;
        if let Some(e) = state.error.take() {
            // Still close what was written before failing.
            let _ = writer.finish();
            return Err(e);
        }
        let location = writer.finish()?;

        let hasher = std::mem::replace(&mut state.hasher, Sha256::new());
        let checksum = format!("{:x}", hasher.finalize());
        state.stats.bitrate = bitrate;
        state.stats.bytes_written = writer.bytes_written();

        log::info!(
            "finished writing {} packets ({} bytes) to {}",
            state.stats.packets_written,
            state.stats.bytes_written,
            location.display()
        );
        Ok((location, checksum, state.stats.clone()))
    }
}

impl<W: ContainerWriter> Default for WriterSink<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: ContainerWriter> PacketSink for WriterSink<W> {
    fn receive_packet(&self, mut packet: EncodedPacket) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.skip_remaining > 0 {
            state.skip_remaining -= 1;
            state.packets_skipped += 1;
            return;
        }
        if state.error.is_some() {
            return;
        }
        let Some(writer) = state.writer.as_mut() else {
            return;
        };

        let destination = packet.format.destination;
        if !state.session_started {
            if let Err(e) = writer.start_session(&packet.format, packet.presentation_time) {
                log::error!("failed to start writer session: {}", e);
                state.error = Some(e);
                return;
            }
            state.session_started = true;
            state.stats.sample_rate = destination.sample_rate;
            state.stats.channels = destination.channels;
        }

        if !writer.is_ready_for_more_data() {
            state.packets_not_ready += 1;
            log::debug!("writer not ready; dropping packet");
            return;
        }

        // The encoder's own primed packets may have been skipped above.
        if state.stats.packets_written == 0 && packet.trim_duration_at_start.is_none() {
            packet.trim_duration_at_start = Some(destination.frames(destination.frames_per_packet));
        }

        if let Err(e) = writer.append(&packet) {
            log::error!("failed to append packet: {}", e);
            state.error = Some(e);
            return;
        }

        state.hasher.update(&packet.data);
        state.stats.packets_written += 1;
        state.stats.frames_written += destination.frames_per_packet as u64 * packet.packet_count as u64;
        if let Some(trim) = packet.trim_duration_at_start {
            let frames = trim.convert_scale(destination.sample_rate as i32).value;
            state.stats.priming_frames += frames.max(0) as u32;
        }
    }
}

/// Capture to encoder to container writer, with start/finish lifecycle.
///
/// Generic over the capture source and the container writer. The capture
/// callback only enqueues buffers onto the encoder's lane; all encoding and
/// writing happens there.
///
/// ```text
/// [CaptureSource] → (lane queue) → [EncodeDriver] → [WriterSink] → [ContainerWriter]
/// ```
pub struct ConversionSession<C: CaptureSource, W: ContainerWriter + 'static> {
    capture: C,
    config: SessionConfiguration,
    encoder: AudioEncoder,
    sink: Arc<WriterSink<W>>,
    state: Mutex<SessionState>,
    delegate: Option<Arc<dyn SessionDelegate>>,
    audio_session: Option<Arc<dyn AudioSession>>,
    audio_session_active: bool,
}

impl<C: CaptureSource, W: ContainerWriter + 'static> ConversionSession<C, W> {
    pub fn new(
        capture: C,
        config: SessionConfiguration,
        candidates: Vec<Box<dyn CodecCandidate>>,
    ) -> Result<Self, EncoderError> {
        config.validate().map_err(EncoderError::ConfigurationFailed)?;
        let sink = Arc::new(WriterSink::new());
        let encoder = AudioEncoder::new(config.encoder.clone(), candidates, sink.clone())?;
        Ok(Self {
            capture,
            config,
            encoder,
            sink,
            state: Mutex::new(SessionState::Idle),
            delegate: None,
            audio_session: None,
            audio_session_active: false,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn set_audio_session(&mut self, audio_session: Arc<dyn AudioSession>) {
        self.audio_session = Some(audio_session);
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn config(&self) -> &SessionConfiguration {
        &self.config
    }

    pub fn available_audio_sources(&self) -> Vec<AudioSource> {
        if self.capture.is_available() {
            vec![self.capture.device_info()]
        } else {
            Vec::new()
        }
    }

    pub fn set_bitrate(&self, bits_per_second: u32) -> Result<(), EncoderError> {
        self.encoder.set_bitrate(bits_per_second)
    }

    pub fn set_muted(&self, muted: bool) -> Result<(), EncoderError> {
        self.encoder.set_muted(muted)
    }

    pub fn diagnostics(&self) -> Result<EncoderDiagnostics, EncoderError> {
        self.encoder.diagnostics()
    }

    /// Packets that never reached the writer (warm-up skip or writer busy).
    pub fn packets_discarded(&self) -> u64 {
        self.sink.packets_discarded()
    }

    /// Feed a buffer directly, as if the capture source had delivered it.
    pub fn submit(&self, buffer: PcmSampleBuffer) -> Result<(), EncoderError> {
        self.encoder.encode_sample_buffer(buffer)
    }

    /// Begin a new session writing into `writer`.
    /// Transitions: idle/completed/failed → starting → running.
    pub fn start(&mut self, writer: W) -> Result<(), EncoderError> {
        if !self.state.lock().can_start() {
            return Err(EncoderError::ConfigurationFailed(
                "can only start from idle, completed, or failed state".into(),
            ));
        }
        self.set_state(SessionState::Starting);

        match self.start_inner(writer) {
            Ok(()) => {
                self.set_state(SessionState::Running);
                Ok(())
            }
            Err(e) => {
                let _ = self.encoder.stop_running();
                self.release_audio_session();
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    fn start_inner(&mut self, writer: W) -> Result<(), EncoderError> {
        if !self.capture.is_available() {
            return Err(EncoderError::DeviceNotAvailable);
        }
        if let Some(ref audio_session) = self.audio_session {
            audio_session.activate()?;
            self.audio_session_active = true;
        }

        self.sink.reset(writer, self.config.skip_leading_packets);
        self.encoder.start_running()?;

        let input = self.encoder.input()?;
        let callback: SampleBufferCallback = Arc::new(move |buffer: PcmSampleBuffer| {
            if let Err(e) = input.encode_sample_buffer(buffer) {
                log::warn!("dropping captured buffer: {}", e);
            }
        });
        self.capture.start(callback)?;
        log::info!("conversion session started");
        Ok(())
    }

    /// Stop capture, drain the encoder, and finalize the writer.
    /// Transitions: running → finishing → completed → idle, or → failed.
    pub fn finish(&mut self) -> Result<SessionResult, EncoderError> {
        if !self.state.lock().is_running() {
            return Err(EncoderError::ConfigurationFailed(
                "can only finish a running session".into(),
            ));
        }
        self.set_state(SessionState::Finishing);

        let outcome = self.finish_inner();
        self.release_audio_session();

        match outcome {
            Ok(result) => {
                self.set_state(SessionState::Completed(Box::new(result.clone())));
                if let Some(ref delegate) = self.delegate {
                    delegate.did_finish_writing(&result.location, &result);
                }
                *self.state.lock() = SessionState::Idle;
                Ok(result)
            }
            Err(e) => {
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    fn finish_inner(&mut self) -> Result<SessionResult, EncoderError> {
        if let Err(e) = self.capture.stop() {
            log::warn!("capture source failed to stop cleanly: {}", e);
        }

        // Queued behind captured input, so it sees the codec before teardown.
        let bitrate = self.encoder.actual_bitrate()?.unwrap_or(0);
        self.encoder.stop_running()?;
        self.encoder.flush()?;

        let (location, checksum, stats) = self.sink.finish(bitrate)?;

        let metadata = SessionMetadata::new(&location.to_string_lossy(), &checksum, &stats);
        if self.config.write_metadata_sidecar {
            metadata::write_metadata(&metadata, &location)?;
        }

        Ok(SessionResult {
            location,
            duration_secs: stats.duration_secs(),
            metadata,
            checksum,
        })
    }

    /// Deactivate the audio session if this session activated it.
    fn release_audio_session(&mut self) {
        if !std::mem::replace(&mut self.audio_session_active, false) {
            return;
        }
        if let Some(ref audio_session) = self.audio_session {
            if let Err(e) = audio_session.deactivate() {
                log::warn!("failed to deactivate audio session: {}", e);
            }
        }
    }

    fn fail(&self, error: EncoderError) {
        log::error!("conversion session failed: {}", error);
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&error);
        }
        self.set_state(SessionState::Failed(error));
    }

    fn set_state(&self, new_state: SessionState) {
        *self.state.lock() = new_state.clone();
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::models::audio_models::AudioTransportType;
    use crate::models::format::{FormatDescriptor, SourceFormat};
    use crate::models::time::MediaTime;
    use crate::testing::{CodecProbe, ScriptedCandidate};

    #[derive(Default)]
    struct Recorded {
        started_at: Option<MediaTime>,
        packets: Vec<EncodedPacket>,
        finished: bool,
    }

    /// In-memory writer that can be told to report "not ready".
    #[derive(Clone, Default)]
    struct MemoryWriter {
        recorded: Arc<Mutex<Recorded>>,
        busy: Arc<Mutex<bool>>,
        fail_append: bool,
        fail_finish: bool,
    }

    impl ContainerWriter for MemoryWriter {
        fn start_session(&mut self, _format: &FormatDescriptor, start_time: MediaTime) -> Result<(), EncoderError> {
            self.recorded.lock().started_at = Some(start_time);
            Ok(())
        }

        fn is_ready_for_more_data(&self) -> bool {
            !*self.busy.lock()
        }

        fn append(&mut self, packet: &EncodedPacket) -> Result<(), EncoderError> {
            if self.fail_append {
                return Err(EncoderError::StorageError("disk full".into()));
            }
            self.recorded.lock().packets.push(packet.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<PathBuf, EncoderError> {
            if self.fail_finish {
                return Err(EncoderError::StorageError("close failed".into()));
            }
            self.recorded.lock().finished = true;
            Ok(PathBuf::from("memory.aac"))
        }

        fn bytes_written(&self) -> u64 {
            self.recorded.lock().packets.iter().map(|p| p.len() as u64).sum()
        }
    }

    /// Capture source that hands its callback to the test.
    #[derive(Clone, Default)]
    struct ManualCapture {
        callback: Arc<Mutex<Option<SampleBufferCallback>>>,
        unavailable: bool,
        start_error: Option<EncoderError>,
    }

    impl ManualCapture {
        fn deliver(&self, buffer: PcmSampleBuffer) {
            let callback = self.callback.lock().clone();
            if let Some(callback) = callback {
                callback(buffer);
            }
        }
    }

    impl CaptureSource for ManualCapture {
        fn is_available(&self) -> bool {
            !self.unavailable
        }

        fn start(&mut self, callback: SampleBufferCallback) -> Result<(), EncoderError> {
            if let Some(ref e) = self.start_error {
                return Err(e.clone());
            }
            *self.callback.lock() = Some(callback);
            Ok(())
        }

        fn stop(&mut self) -> Result<(), EncoderError> {
            *self.callback.lock() = None;
            Ok(())
        }

        fn device_info(&self) -> AudioSource {
            AudioSource {
                id: "manual".into(),
                name: "Manual".into(),
                is_default: true,
                transport_type: Some(AudioTransportType::Virtual),
            }
        }
    }

    #[derive(Default)]
    struct RecordingDelegate {
        states: Mutex<Vec<SessionState>>,
        errors: Mutex<Vec<EncoderError>>,
        finished: Mutex<Vec<PathBuf>>,
    }

    impl SessionDelegate for RecordingDelegate {
        fn on_state_changed(&self, state: &SessionState) {
            self.states.lock().push(state.clone());
        }

        fn on_error(&self, error: &EncoderError) {
            self.errors.lock().push(error.clone());
        }

        fn did_finish_writing(&self, location: &Path, _result: &SessionResult) {
            self.finished.lock().push(location.to_path_buf());
        }
    }

    /// Counts activations still outstanding.
    #[derive(Default)]
    struct CountingAudioSession {
        activations: Mutex<u32>,
        deactivations: Mutex<u32>,
    }

    impl CountingAudioSession {
        fn active(&self) -> u32 {
            *self.activations.lock() - *self.deactivations.lock()
        }
    }

    impl AudioSession for CountingAudioSession {
        fn activate(&self) -> Result<(), EncoderError> {
            *self.activations.lock() += 1;
            Ok(())
        }

        fn deactivate(&self) -> Result<(), EncoderError> {
            *self.deactivations.lock() += 1;
            Ok(())
        }
    }

    fn buffer(pts: i64) -> PcmSampleBuffer {
        let format = SourceFormat::interleaved_i16(44100.0, 1);
        PcmSampleBuffer::interleaved(format, MediaTime::new(pts, 44100), vec![5u8; 2048]).unwrap()
    }

    fn session(
        config: SessionConfiguration,
        probe: &CodecProbe,
    ) -> (ConversionSession<ManualCapture, MemoryWriter>, ManualCapture) {
        let capture = ManualCapture::default();
        let candidates: Vec<Box<dyn CodecCandidate>> =
            vec![Box::new(ScriptedCandidate::new("scripted", probe.clone()))];
        let session = ConversionSession::new(capture.clone(), config, candidates).unwrap();
        (session, capture)
    }

    #[test]
    fn start_deliver_finish() {
        let probe = CodecProbe::default();
        let (mut session, capture) = session(SessionConfiguration::default(), &probe);
        let delegate = Arc::new(RecordingDelegate::default());
        session.set_delegate(delegate.clone());
        let writer = MemoryWriter::default();

        session.start(writer.clone()).unwrap();
        assert!(session.state().is_running());
        for i in 0..3 {
            capture.deliver(buffer(1000 + i * 1024));
        }
        let result = session.finish().unwrap();

        let recorded = writer.recorded.lock();
        assert!(recorded.finished);
        assert_eq!(recorded.started_at, Some(MediaTime::new(1000, 44100)));
        assert_eq!(recorded.packets.len(), 3);

        assert_eq!(result.location, PathBuf::from("memory.aac"));
        assert_eq!(result.metadata.packets_written, 3);
        assert_eq!(result.metadata.bitrate, 32768);
        assert_eq!(result.metadata.priming_frames, 1024 + 64);
        assert_eq!(result.checksum.len(), 64);
        assert!((result.duration_secs - (3072.0 - 1088.0) / 44100.0).abs() < 1e-9);

        assert!(session.state().is_idle());
        assert_eq!(delegate.finished.lock().as_slice(), &[PathBuf::from("memory.aac")]);
        let states = delegate.states.lock();
        assert!(matches!(states[0], SessionState::Starting));
        assert!(matches!(states[1], SessionState::Running));
        assert!(matches!(states[2], SessionState::Finishing));
        assert!(matches!(states[3], SessionState::Completed(_)));
        assert_eq!(probe.disposed(), 1);
    }

    #[test]
    fn skipped_warm_up_still_gets_a_trim() {
        let probe = CodecProbe::default();
        let config = SessionConfiguration {
            skip_leading_packets: 2,
            ..Default::default()
        };
        let (mut session, capture) = session(config, &probe);
        let writer = MemoryWriter::default();

        session.start(writer.clone()).unwrap();
        for i in 0..4 {
            capture.deliver(buffer(i * 1024));
        }
        session.finish().unwrap();

        let recorded = writer.recorded.lock();
        assert_eq!(recorded.packets.len(), 2);
        assert_eq!(recorded.started_at, Some(MediaTime::new(2048, 44100)));
        assert_eq!(
            recorded.packets[0].trim_duration_at_start,
            Some(MediaTime::new(1024, 44100))
        );
        assert_eq!(recorded.packets[1].trim_duration_at_start, None);
        assert_eq!(session.packets_discarded(), 2);
    }

    #[test]
    fn busy_writer_drops_packets() {
        let probe = CodecProbe::default();
        let (mut session, capture) = session(SessionConfiguration::default(), &probe);
        let writer = MemoryWriter::default();

        session.start(writer.clone()).unwrap();
        capture.deliver(buffer(0));
        session.diagnostics().unwrap();
        *writer.busy.lock() = true;
        capture.deliver(buffer(1024));
        session.diagnostics().unwrap();
        *writer.busy.lock() = false;
        capture.deliver(buffer(2048));
        let result = session.finish().unwrap();

        assert_eq!(result.metadata.packets_written, 2);
        assert_eq!(session.packets_discarded(), 1);
    }

    #[test]
    fn finish_requires_running() {
        let probe = CodecProbe::default();
        let (mut session, _capture) = session(SessionConfiguration::default(), &probe);
        assert!(matches!(session.finish(), Err(EncoderError::ConfigurationFailed(_))));
    }

    #[test]
    fn start_twice_is_rejected() {
        let probe = CodecProbe::default();
        let (mut session, _capture) = session(SessionConfiguration::default(), &probe);
        session.start(MemoryWriter::default()).unwrap();
        assert!(session.start(MemoryWriter::default()).is_err());
        assert!(session.state().is_running());
    }

    #[test]
    fn unavailable_capture_fails_start() {
        let probe = CodecProbe::default();
        let capture = ManualCapture {
            unavailable: true,
            ..Default::default()
        };
        let candidates: Vec<Box<dyn CodecCandidate>> =
            vec![Box::new(ScriptedCandidate::new("scripted", probe.clone()))];
        let mut session: ConversionSession<ManualCapture, MemoryWriter> =
            ConversionSession::new(capture, SessionConfiguration::default(), candidates).unwrap();
        let delegate = Arc::new(RecordingDelegate::default());
        session.set_delegate(delegate.clone());

        assert_eq!(session.start(MemoryWriter::default()), Err(EncoderError::DeviceNotAvailable));
        assert!(matches!(session.state(), SessionState::Failed(EncoderError::DeviceNotAvailable)));
        assert_eq!(delegate.errors.lock().as_slice(), &[EncoderError::DeviceNotAvailable]);
        assert!(session.state().can_start());
    }

    #[test]
    fn sessions_can_be_repeated() {
        let probe = CodecProbe::default();
        let (mut session, capture) = session(SessionConfiguration::default(), &probe);

        for _ in 0..2 {
            let writer = MemoryWriter::default();
            session.start(writer.clone()).unwrap();
            capture.deliver(buffer(0));
            let result = session.finish().unwrap();
            assert_eq!(result.metadata.packets_written, 1);
            assert_eq!(writer.recorded.lock().packets[0].trim_duration_at_start, Some(MediaTime::new(1024, 44100)));
        }
        assert_eq!(probe.built(), 2);
    }

    #[test]
    fn metadata_sidecar_is_written() {
        let probe = CodecProbe::default();
        let config = SessionConfiguration {
            write_metadata_sidecar: true,
            ..Default::default()
        };
        let capture = ManualCapture::default();
        let candidates: Vec<Box<dyn CodecCandidate>> =
            vec![Box::new(ScriptedCandidate::new("scripted", probe.clone()))];
        let mut session: ConversionSession<ManualCapture, crate::storage::adts_writer::AdtsFileWriter> =
            ConversionSession::new(capture.clone(), config, candidates).unwrap();

        let path = std::env::temp_dir().join(format!("aac_stream_session_{}.aac", uuid::Uuid::new_v4()));
        session
            .start(crate::storage::adts_writer::AdtsFileWriter::new(path.clone()))
            .unwrap();
        capture.deliver(buffer(0));
        let result = session.finish().unwrap();

        let sidecar = metadata::read_metadata(&path).unwrap();
        assert_eq!(sidecar.checksum, result.checksum);
        assert_eq!(sidecar.packets_written, 1);

        std::fs::remove_file(metadata::metadata_path(&path)).ok();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn failed_capture_start_releases_audio_session() {
        let probe = CodecProbe::default();
        let capture = ManualCapture {
            start_error: Some(EncoderError::PermissionDenied),
            ..Default::default()
        };
        let candidates: Vec<Box<dyn CodecCandidate>> =
            vec![Box::new(ScriptedCandidate::new("scripted", probe.clone()))];
        let mut session: ConversionSession<ManualCapture, MemoryWriter> =
            ConversionSession::new(capture, SessionConfiguration::default(), candidates).unwrap();
        let audio_session = Arc::new(CountingAudioSession::default());
        session.set_audio_session(audio_session.clone());
        let delegate = Arc::new(RecordingDelegate::default());
        session.set_delegate(delegate.clone());

        assert_eq!(session.start(MemoryWriter::default()), Err(EncoderError::PermissionDenied));
        assert_eq!(*audio_session.activations.lock(), 1);
        assert_eq!(audio_session.active(), 0);
        assert!(matches!(session.state(), SessionState::Failed(EncoderError::PermissionDenied)));
        assert_eq!(delegate.errors.lock().as_slice(), &[EncoderError::PermissionDenied]);
    }

    #[test]
    fn audio_session_is_balanced_across_a_run() {
        let probe = CodecProbe::default();
        let (mut session, capture) = session(SessionConfiguration::default(), &probe);
        let audio_session = Arc::new(CountingAudioSession::default());
        session.set_audio_session(audio_session.clone());

        session.start(MemoryWriter::default()).unwrap();
        assert_eq!(audio_session.active(), 1);
        capture.deliver(buffer(0));
        session.finish().unwrap();
        assert_eq!(audio_session.active(), 0);
        assert_eq!(*audio_session.deactivations.lock(), 1);
    }

    #[test]
    fn append_failure_fails_finish() {
        let probe = CodecProbe::default();
        let (mut session, capture) = session(SessionConfiguration::default(), &probe);
        let audio_session = Arc::new(CountingAudioSession::default());
        session.set_audio_session(audio_session.clone());
        let delegate = Arc::new(RecordingDelegate::default());
        session.set_delegate(delegate.clone());
        let writer = MemoryWriter {
            fail_append: true,
            ..Default::default()
        };

        session.start(writer.clone()).unwrap();
        capture.deliver(buffer(0));
        capture.deliver(buffer(1024));
        let expected = EncoderError::StorageError("disk full".into());

        assert_eq!(session.finish(), Err(expected.clone()));
        assert!(matches!(session.state(), SessionState::Failed(ref e) if *e == expected));
        assert_eq!(delegate.errors.lock().as_slice(), &[expected]);
        assert!(delegate.finished.lock().is_empty());
        assert_eq!(audio_session.active(), 0);
        assert!(writer.recorded.lock().packets.is_empty());
        assert!(session.state().can_start());
    }

    #[test]
    fn writer_finish_failure_fails_finish() {
        let probe = CodecProbe::default();
        let (mut session, capture) = session(SessionConfiguration::default(), &probe);
        let audio_session = Arc::new(CountingAudioSession::default());
        session.set_audio_session(audio_session.clone());
        let delegate = Arc::new(RecordingDelegate::default());
        session.set_delegate(delegate.clone());
        let writer = MemoryWriter {
            fail_finish: true,
            ..Default::default()
        };

        session.start(writer.clone()).unwrap();
        capture.deliver(buffer(0));
        let expected = EncoderError::StorageError("close failed".into());

        assert_eq!(session.finish(), Err(expected.clone()));
        assert!(matches!(session.state(), SessionState::Failed(_)));
        assert_eq!(delegate.errors.lock().as_slice(), &[expected]);
        assert_eq!(audio_session.active(), 0);
        assert_eq!(writer.recorded.lock().packets.len(), 1);
        assert!(!writer.recorded.lock().finished);
    }

    #[test]
    fn audio_sources_come_from_the_capture_source() {
        let probe = CodecProbe::default();
        let (session, _capture) = session(SessionConfiguration::default(), &probe);
        let sources = session.available_audio_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].transport_type, Some(AudioTransportType::Virtual));

        let candidates: Vec<Box<dyn CodecCandidate>> =
            vec![Box::new(ScriptedCandidate::new("scripted", probe.clone()))];
        let unavailable = ManualCapture {
            unavailable: true,
            ..Default::default()
        };
        let session: ConversionSession<ManualCapture, MemoryWriter> =
            ConversionSession::new(unavailable, SessionConfiguration::default(), candidates).unwrap();
        assert!(session.available_audio_sources().is_empty());
    }
}
