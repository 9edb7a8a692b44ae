//! Scripted codec, candidate, and sink shared by the module tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::EncoderError;
use crate::models::format::{DestinationFormat, SourceFormat, AAC_FRAMES_PER_PACKET};
use crate::models::packet::EncodedPacket;
use crate::models::raw_buffer::RawBufferList;
use crate::traits::codec::{AudioCodec, FillStatus, InputProvider, PullStatus};
use crate::traits::codec_candidate::CodecCandidate;
use crate::traits::packet_sink::PacketSink;

#[derive(Debug, Default)]
struct ProbeState {
    bitrate_attempts: Vec<u32>,
    built: usize,
    disposed: usize,
    fills: usize,
    served_inputs: usize,
    silent_inputs: Vec<bool>,
}

/// Shared record of everything the scripted codecs were asked to do.
#[derive(Debug, Clone, Default)]
pub(crate) struct CodecProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl CodecProbe {
    pub fn bitrate_attempts(&self) -> Vec<u32> {
        self.state.lock().bitrate_attempts.clone()
    }

    pub fn built(&self) -> usize {
        self.state.lock().built
    }

    pub fn disposed(&self) -> usize {
        self.state.lock().disposed
    }

    pub fn fills(&self) -> usize {
        self.state.lock().fills
    }

    pub fn served_inputs(&self) -> usize {
        self.state.lock().served_inputs
    }

    /// One entry per served input: true if every byte was zero.
    pub fn silent_inputs(&self) -> Vec<bool> {
        self.state.lock().silent_inputs.clone()
    }
}

type AcceptFn = Arc<dyn Fn(u32) -> bool + Send + Sync>;

/// Emits one fake access unit per `frames_per_packet` frames pulled.
pub(crate) struct ScriptedCodec {
    name: String,
    probe: CodecProbe,
    accept: AcceptFn,
    bytes_per_frame: usize,
    frames_per_packet: usize,
    pending_frames: usize,
    emitted: u8,
    fail_on_fill: Option<usize>,
}

impl AudioCodec for ScriptedCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn fill(
        &mut self,
        input: &mut dyn InputProvider,
        _max_packets: u32,
        output: &mut RawBufferList,
    ) -> Result<FillStatus, EncoderError> {
        let fills = {
            let mut state = self.probe.state.lock();
            state.fills += 1;
            state.fills
        };
        if self.fail_on_fill == Some(fills) {
            return Err(EncoderError::EncodeFailed("scripted failure".into()));
        }

        while self.pending_frames < self.frames_per_packet {
            match input.pull_input() {
                PullStatus::Packet(list) => {
                    let bytes = list.buffer(0).map(|b| b.len()).unwrap_or(0);
                    let silent = list.iter().all(|b| b.bytes().iter().all(|&x| x == 0));
                    self.pending_frames += bytes / self.bytes_per_frame.max(1);
                    let mut state = self.probe.state.lock();
                    state.served_inputs += 1;
                    state.silent_inputs.push(silent);
                }
                PullStatus::Exhausted => return Ok(FillStatus::NoMoreInput),
            }
        }

        self.pending_frames -= self.frames_per_packet;
        self.emitted = self.emitted.wrapping_add(1);
        if let Some(buffer) = output.buffer_mut(0) {
            buffer.fill_from(&[self.emitted; 12]);
        }
        Ok(FillStatus::Packets(1))
    }

    fn set_bitrate(&mut self, bits_per_second: u32) -> Result<(), EncoderError> {
        self.probe.state.lock().bitrate_attempts.push(bits_per_second);
        if (self.accept)(bits_per_second) {
            Ok(())
        } else {
            Err(EncoderError::rejected("bitrate", bits_per_second, "scripted rejection"))
        }
    }
}

impl Drop for ScriptedCodec {
    fn drop(&mut self) {
        self.probe.state.lock().disposed += 1;
    }
}

/// A codec for 16-bit mono input that accepts bitrates matching `accept`.
pub(crate) fn scripted_codec(
    probe: &CodecProbe,
    accept: impl Fn(u32) -> bool + Send + Sync + 'static,
) -> Box<dyn AudioCodec> {
    Box::new(ScriptedCodec {
        name: "scripted".into(),
        probe: probe.clone(),
        accept: Arc::new(accept),
        bytes_per_frame: 2,
        frames_per_packet: AAC_FRAMES_PER_PACKET as usize,
        pending_frames: 0,
        emitted: 0,
        fail_on_fill: None,
    })
}

/// Candidate that builds `ScriptedCodec`s, or always fails.
pub(crate) struct ScriptedCandidate {
    name: String,
    probe: Option<CodecProbe>,
    accept: AcceptFn,
    fail_on_fill: Option<usize>,
}

impl ScriptedCandidate {
    pub fn new(name: &str, probe: CodecProbe) -> Self {
        Self {
            name: name.into(),
            probe: Some(probe),
            accept: Arc::new(|_| true),
            fail_on_fill: None,
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.into(),
            probe: None,
            accept: Arc::new(|_| true),
            fail_on_fill: None,
        }
    }

    /// Built codecs reject every bitrate for which `accept` is false.
    pub fn accepting(mut self, accept: impl Fn(u32) -> bool + Send + Sync + 'static) -> Self {
        self.accept = Arc::new(accept);
        self
    }

    /// Built codecs return `EncodeFailed` on the n-th fill (1-based, counted across codecs).
    pub fn failing_on_fill(mut self, fill: usize) -> Self {
        self.fail_on_fill = Some(fill);
        self
    }
}

impl CodecCandidate for ScriptedCandidate {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(
        &self,
        source: &SourceFormat,
        destination: &DestinationFormat,
    ) -> Result<Box<dyn AudioCodec>, EncoderError> {
        let probe = self
            .probe
            .clone()
            .ok_or_else(|| EncoderError::CodecUnavailable("scripted unavailable".into()))?;
        probe.state.lock().built += 1;
        Ok(Box::new(ScriptedCodec {
            name: self.name.clone(),
            probe,
            accept: Arc::clone(&self.accept),
            bytes_per_frame: source.bytes_per_frame as usize,
            frames_per_packet: destination.frames_per_packet as usize,
            pending_frames: 0,
            emitted: 0,
            fail_on_fill: self.fail_on_fill,
        }))
    }
}

/// Packet sink that keeps everything it receives.
#[derive(Default)]
pub(crate) struct CollectingSink {
    packets: Mutex<Vec<EncodedPacket>>,
}

impl CollectingSink {
    pub fn packets(&self) -> Vec<EncodedPacket> {
        self.packets.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.packets.lock().len()
    }
}

impl PacketSink for CollectingSink {
    fn receive_packet(&self, packet: EncodedPacket) {
        self.packets.lock().push(packet);
    }
}
