use std::cmp::Ordering as TimeOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::models::audio_models::EncoderDiagnostics;
use crate::models::config::EncoderConfiguration;
use crate::models::format::{DestinationFormat, FormatDescriptor};
use crate::models::packet::EncodedPacket;
use crate::models::raw_buffer::RawBufferList;
use crate::models::sample_buffer::PcmSampleBuffer;
use crate::models::state::EncodePhase;
use crate::models::time::MediaTime;
use crate::processing::adts::ADTS_HEADER_SIZE;
use crate::processing::bitrate::BitrateController;
use crate::processing::buffer_pool::RawBufferPool;
use crate::processing::format_negotiator::{FormatNegotiator, FormatObservation};
use crate::processing::priming::{PrimingPolicy, PrimingTracker};
use crate::processing::pull_adapter::{PendingInput, PullAdapter};
use crate::traits::codec::{AudioCodec, FillStatus};
use crate::traits::codec_candidate::CodecCandidate;
use crate::traits::packet_sink::PacketSink;

/// Upper bound of one AAC access unit: 6144 bits per channel.
const MAX_ACCESS_UNIT_BYTES_PER_CHANNEL: usize = 768;

/// Packets requested from the codec per fill.
const PACKETS_PER_FILL: u32 = 1;

/// Turns staged PCM buffers into timed, primed AAC packets.
///
/// Owns every piece of codec state for one running interval. It lives on the
/// encode lane and is never shared; the only state visible from other threads
/// is the `running` flag.
///
/// ```text
/// encode_sample_buffer
///   ├─ running? ── no ──→ drop
///   ├─ observe format / build codec (first buffer only)
///   ├─ stage into pool (zero if muted) → slot Filled
///   └─ pass: fill → packet → fill → packet → ... → NoMoreInput | error
/// ```
pub struct EncodeDriver {
    running: Arc<AtomicBool>,
    negotiator: FormatNegotiator,
    pool: RawBufferPool,
    pending: PendingInput,
    bitrate: BitrateController,
    codec: Option<Box<dyn AudioCodec>>,
    codec_failed: bool,
    priming_policy: PrimingPolicy,
    priming: PrimingTracker,
    muted: bool,
    sink: Arc<dyn PacketSink>,
    phase: EncodePhase,
    last_presentation_time: MediaTime,
    diagnostics: EncoderDiagnostics,
}

impl EncodeDriver {
    pub fn new(
        config: &EncoderConfiguration,
        candidates: Vec<Box<dyn CodecCandidate>>,
        sink: Arc<dyn PacketSink>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            running,
            negotiator: FormatNegotiator::new(config, candidates),
            pool: RawBufferPool::new(),
            pending: PendingInput::Empty,
            bitrate: BitrateController::new(
                config.bitrate,
                config.minimum_bitrate,
                config.bitrate_step,
            ),
            codec: None,
            codec_failed: false,
            priming_policy: config.priming,
            priming: PrimingTracker::default(),
            muted: config.muted,
            sink,
            phase: EncodePhase::Idle,
            last_presentation_time: MediaTime::INVALID,
            diagnostics: EncoderDiagnostics {
                requested_bitrate: config.bitrate,
                ..Default::default()
            },
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start_running(&mut self) {
        self.running.store(true, Ordering::SeqCst);
        log::info!("encoder running");
    }

    /// Dispose the codec, clear the format caches, and stop honoring input.
    pub fn stop_running(&mut self) {
        self.teardown();
        self.running.store(false, Ordering::SeqCst);
        log::info!("encoder stopped");
    }

    /// Same teardown as `stop_running` but leaves the running flag alone.
    pub fn invalidate(&mut self) {
        self.teardown();
        log::info!("encoder invalidated");
    }

    fn teardown(&mut self) {
        if let Some(codec) = self.codec.take() {
            log::debug!("disposing codec {}", codec.name());
        }
        self.codec_failed = false;
        self.negotiator.reset();
        self.bitrate.reset();
        self.priming.reset();
        self.pending.reset();
        self.phase = EncodePhase::Idle;
        self.last_presentation_time = MediaTime::INVALID;
        self.diagnostics.codec_name = None;
        self.diagnostics.source_format = None;
    }

    /// Request a per-channel bitrate. Deferred until a codec exists.
    pub fn set_bitrate(&mut self, bits_per_second: u32) {
        let channels = self.channels();
        let actual = match self.codec.as_mut() {
            Some(codec) => self.bitrate.apply(bits_per_second, Some(codec.as_mut()), channels),
            None => self.bitrate.apply(bits_per_second, None, channels),
        };
        log::debug!("bitrate request {} -> {:?}", bits_per_second, actual);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn actual_bitrate(&self) -> Option<u32> {
        self.bitrate.actual()
    }

    pub fn phase(&self) -> EncodePhase {
        self.phase
    }

    pub fn diagnostics(&self) -> EncoderDiagnostics {
        let mut diagnostics = self.diagnostics.clone();
        diagnostics.requested_bitrate = self.bitrate.requested();
        diagnostics.actual_bitrate = self.bitrate.actual();
        diagnostics.phase = self.phase;
        diagnostics
    }

    fn channels(&self) -> u32 {
        self.negotiator
            .descriptor()
            .map(|d| d.destination.channels)
            .unwrap_or(1)
    }

    /// Encode one captured buffer into zero or more packets.
    ///
    /// Never fails outward: buffers that cannot be encoded are dropped and
    /// counted in the diagnostics.
    pub fn encode_sample_buffer(&mut self, buffer: PcmSampleBuffer) {
        if !self.is_running() {
            log::trace!("encoder not running; ignoring buffer");
            return;
        }
        self.diagnostics.buffers_received += 1;

        match self.negotiator.observe_first_input(buffer.format()) {
            FormatObservation::First => {
                self.pool.ensure_capacity(buffer.format());
                self.diagnostics.source_format = Some(*buffer.format());
            }
            FormatObservation::Unchanged | FormatObservation::RateChanged => {}
            FormatObservation::GeometryChanged => {
                self.diagnostics.buffers_dropped += 1;
                return;
            }
        }

        if !self.ensure_codec() {
            self.diagnostics.buffers_dropped += 1;
            return;
        }

        if let Err(e) = self.pool.stage(&buffer) {
            log::warn!("dropping buffer that could not be staged: {}", e);
            self.diagnostics.buffers_dropped += 1;
            return;
        }
        if self.muted {
            self.pool.current_buffers_mut().zero();
        }
        let staged = self.pending.fill();
        debug_assert!(staged, "previous input was never served");
        if !staged {
            log::warn!("staged input overwritten before the codec pulled it");
        }

        self.run_pass(buffer.presentation_time());
    }

    /// Build the codec on first use. Returns false while no codec can exist.
    fn ensure_codec(&mut self) -> bool {
        if self.codec.is_some() {
            return true;
        }
        if self.codec_failed {
            return false;
        }
        let Some(source) = self.negotiator.source_format().copied() else {
            return false;
        };
        let destination = self.negotiator.destination_format();

        match self.negotiator.build_codec(&source, &destination) {
            Ok(mut codec) => {
                let actual = self.bitrate.reapply(codec.as_mut(), destination.channels);
                self.negotiator.describe(codec.as_ref());
                log::info!(
                    "codec {} ready: {} Hz, {} ch, {} bps per channel",
                    codec.name(),
                    destination.sample_rate,
                    destination.channels,
                    actual
                );
                self.diagnostics.codec_name = Some(codec.name().to_string());
                self.codec = Some(codec);
                true
            }
            Err(e) => {
                log::error!("{}; encoded output disabled until restart", e);
                self.codec_failed = true;
                false
            }
        }
    }

    /// Drive the codec over the staged input until it runs dry.
    fn run_pass(&mut self, source_time: MediaTime) {
        let Some(codec) = self.codec.as_mut() else {
            return;
        };
        let Some(descriptor) = self.negotiator.descriptor() else {
            return;
        };
        let destination = descriptor.destination;
        let capacity =
            MAX_ACCESS_UNIT_BYTES_PER_CHANNEL * destination.channels.max(1) as usize + ADTS_HEADER_SIZE;

        self.phase = EncodePhase::Converting;
        self.diagnostics.passes += 1;
        let mut emitted_in_pass: i64 = 0;

        loop {
            // Dropped at the end of every iteration, including the error paths.
            let mut output = RawBufferList::allocate(1, destination.channels, capacity);

            let (status, consumed) = {
                let mut adapter = PullAdapter::new(self.pool.current_buffers(), &mut self.pending);
                let status = codec.fill(&mut adapter, PACKETS_PER_FILL, &mut output);
                (status, adapter.is_consumed())
            };
            if consumed {
                self.phase = EncodePhase::Draining;
            }

            match status {
                Ok(FillStatus::Packets(count)) if count > 0 => {
                    let data = output
                        .buffer(0)
                        .map(|b| Bytes::copy_from_slice(b.bytes()))
                        .unwrap_or_default();
                    let packet = build_packet(
                        data,
                        count,
                        &descriptor,
                        &destination,
                        next_presentation_time(
                            &mut self.last_presentation_time,
                            source_time,
                            &destination,
                            emitted_in_pass,
                        ),
                        self.priming.next(&self.priming_policy, &destination),
                    );
                    emitted_in_pass += count as i64;
                    self.diagnostics.packets_emitted += 1;
                    log::trace!(
                        "packet {} bytes at {:.6}s",
                        packet.len(),
                        packet.presentation_time.seconds()
                    );
                    self.sink.receive_packet(packet);
                }
                Ok(FillStatus::Packets(_)) | Ok(FillStatus::NoMoreInput) => break,
                Err(e) => {
                    log::warn!("encode pass aborted: {}", e);
                    self.diagnostics.transient_errors += 1;
                    break;
                }
            }
        }

        self.pending.reset();
        self.phase = EncodePhase::Idle;
    }
}

/// The source time for the first packet of a pass, shifted by one packet
/// duration for each packet after it. Never moves backwards.
fn next_presentation_time(
    last: &mut MediaTime,
    source_time: MediaTime,
    destination: &DestinationFormat,
    emitted_in_pass: i64,
) -> MediaTime {
    let mut time = if emitted_in_pass == 0 {
        source_time
    } else {
        source_time
            .checked_add(destination.packet_duration().scaled(emitted_in_pass))
            .unwrap_or(source_time)
    };
    if time.compare(last) == Some(TimeOrdering::Less) {
        time = *last;
    }
    if time.is_valid() {
        *last = time;
    }
    time
}

fn build_packet(
    data: Bytes,
    count: u32,
    descriptor: &Arc<FormatDescriptor>,
    destination: &DestinationFormat,
    presentation_time: MediaTime,
    trim: Option<MediaTime>,
) -> EncodedPacket {
    let sample_size = data.len() / count.max(1) as usize;
    EncodedPacket {
        data,
        format: Arc::clone(descriptor),
        presentation_time,
        duration: destination.packet_duration(),
        packet_count: count,
        sample_size,
        trim_duration_at_start: trim,
    }
}
