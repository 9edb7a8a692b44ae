//! AAC-LC encoding through fdk-aac.
//!
//! fdk-aac consumes interleaved 16-bit PCM and produces one access unit per
//! 1024 frames once its internal delay has filled. The codec pulls staged
//! input through the core's `InputProvider`, converts it to the destination
//! channel count, and encodes whenever a full frame of samples is buffered.

use std::collections::VecDeque;

use bytes::Bytes;
use fdk_aac::enc::{AudioObjectType, BitRate, ChannelMode, Encoder, EncoderParams, Transport};

use aac_stream_core::models::error::EncoderError;
use aac_stream_core::models::format::{AacTransport, DestinationFormat, SourceFormat};
use aac_stream_core::models::raw_buffer::RawBufferList;
use aac_stream_core::processing::adts::ADTS_HEADER_SIZE;
use aac_stream_core::processing::pcm;
use aac_stream_core::traits::codec::{AudioCodec, FillStatus, InputProvider, PullStatus};

/// Largest access unit AAC allows per channel (6144 bits).
const MAX_ACCESS_UNIT_BYTES_PER_CHANNEL: usize = 768;

/// Lowest per-channel bitrate fdk-aac encodes AAC-LC at.
const MIN_BITRATE_PER_CHANNEL: u32 = 8000;

/// fdk-aac AAC-LC encoder behind the `AudioCodec` pull contract.
///
/// fdk-aac fixes the bitrate when the encoder is opened, so a bitrate change
/// reopens it. Samples buffered here carry over, but the roughly one access
/// unit of lookahead held inside the old encoder is discarded, which can cause
/// a short discontinuity at the switch. The bitrate controller settles the
/// value before the first packet, so only requests made mid-stream hit this.
pub struct FdkAacCodec {
    name: String,
    encoder: Encoder,
    source: SourceFormat,
    destination: DestinationFormat,
    transport: AacTransport,
    bitrate: u32,
    pending: VecDeque<i16>,
    scratch: Vec<u8>,
    magic_cookie: Option<Bytes>,
}

// SAFETY: the fdk-aac handle is only used through `&mut self`, and the codec is
// owned by a single encode lane at a time.
unsafe impl Send for FdkAacCodec {}

impl FdkAacCodec {
    /// Open an encoder for `source` → `destination` at `bitrate` bits per second in total.
    pub fn new(
        name: impl Into<String>,
        source: SourceFormat,
        destination: DestinationFormat,
        transport: AacTransport,
        bitrate: u32,
    ) -> Result<Self, EncoderError> {
        if source.sample_rate.round() as u32 != destination.sample_rate {
            return Err(EncoderError::InvalidFormat(format!(
                "source rate {} Hz differs from destination rate {} Hz; resampling is not supported",
                source.sample_rate, destination.sample_rate
            )));
        }
        source.validate()?;

        let encoder = open_encoder(&destination, transport, bitrate)?;
        let magic_cookie = match transport {
            AacTransport::Raw => read_magic_cookie(&encoder),
            AacTransport::Adts => None,
        };
        let channels = destination.channels.max(1) as usize;

        Ok(Self {
            name: name.into(),
            encoder,
            source,
            destination,
            transport,
            bitrate,
            pending: VecDeque::with_capacity(destination.frames_per_packet as usize * channels * 2),
            scratch: vec![0u8; MAX_ACCESS_UNIT_BYTES_PER_CHANNEL * channels + ADTS_HEADER_SIZE],
            magic_cookie,
        })
    }

    /// Total bitrate the encoder is currently configured with.
    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    /// Interleaved samples buffered but not yet encoded.
    pub fn pending_samples(&self) -> usize {
        self.pending.len()
    }

    fn samples_per_packet(&self) -> usize {
        self.destination.frames_per_packet as usize * self.destination.channels.max(1) as usize
    }

    fn max_bitrate(&self) -> u32 {
        // 6144 bits per channel per 1024-frame access unit.
        let per_channel = 6 * self.destination.sample_rate;
        per_channel * self.destination.channels.max(1)
    }
}

impl AudioCodec for FdkAacCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn fill(
        &mut self,
        input: &mut dyn InputProvider,
        _max_packets: u32,
        output: &mut RawBufferList,
    ) -> Result<FillStatus, EncoderError> {
        let samples_per_packet = self.samples_per_packet();
        let out_channels = self.destination.channels.max(1) as usize;

        loop {
            while self.pending.len() < samples_per_packet {
                match input.pull_input() {
                    PullStatus::Packet(list) => {
                        let samples = pcm::to_interleaved_i16(list, &self.source, out_channels)?;
                        self.pending.extend(samples);
                    }
                    PullStatus::Exhausted => return Ok(FillStatus::NoMoreInput),
                }
            }

            let chunk: Vec<i16> = self.pending.drain(..samples_per_packet).collect();
            let info = self
                .encoder
                .encode(&chunk, &mut self.scratch)
                .map_err(|e| EncoderError::EncodeFailed(format!("fdk-aac: {:?}", e)))?;

            // Anything the encoder did not take goes back to the front, in order.
            for &sample in chunk[info.input_consumed.min(chunk.len())..].iter().rev() {
                self.pending.push_front(sample);
            }

            if info.output_size > 0 {
                let target = output
                    .buffer_mut(0)
                    .ok_or_else(|| EncoderError::EncodeFailed("no output buffer".into()))?;
                target.fill_from(&self.scratch[..info.output_size]);
                return Ok(FillStatus::Packets(1));
            }
            log::trace!("fdk-aac still priming; {} samples pending", self.pending.len());
            if info.input_consumed == 0 {
                return Err(EncoderError::EncodeFailed(
                    "fdk-aac consumed no input and produced no output".into(),
                ));
            }
        }
    }

    fn set_bitrate(&mut self, bits_per_second: u32) -> Result<(), EncoderError> {
        let channels = self.destination.channels.max(1);
        if bits_per_second < MIN_BITRATE_PER_CHANNEL * channels || bits_per_second > self.max_bitrate() {
            return Err(EncoderError::rejected(
                "bitrate",
                bits_per_second,
                format!(
                    "fdk-aac supports {}..={} bps for {} channel(s) at {} Hz",
                    MIN_BITRATE_PER_CHANNEL * channels,
                    self.max_bitrate(),
                    channels,
                    self.destination.sample_rate
                ),
            ));
        }
        if bits_per_second == self.bitrate {
            return Ok(());
        }

        // Reopen; pending samples carry over, the old encoder's lookahead does not.
        self.encoder = open_encoder(&self.destination, self.transport, bits_per_second)
            .map_err(|e| EncoderError::rejected("bitrate", bits_per_second, e.to_string()))?;
        self.bitrate = bits_per_second;
        log::debug!("{} reopened at {} bps", self.name, bits_per_second);
        Ok(())
    }

    fn transport(&self) -> AacTransport {
        self.transport
    }

    fn magic_cookie(&self) -> Option<Bytes> {
        self.magic_cookie.clone()
    }
}

fn open_encoder(
    destination: &DestinationFormat,
    transport: AacTransport,
    bitrate: u32,
) -> Result<Encoder, EncoderError> {
    let channels = match destination.channels {
        1 => ChannelMode::Mono,
        2 => ChannelMode::Stereo,
        n => {
            return Err(EncoderError::InvalidFormat(format!(
                "fdk-aac backend supports 1 or 2 channels, got {}",
                n
            )))
        }
    };
    let params = EncoderParams {
        bit_rate: BitRate::Cbr(bitrate),
        sample_rate: destination.sample_rate,
        transport: match transport {
            AacTransport::Raw => Transport::Raw,
            AacTransport::Adts => Transport::Adts,
        },
        channels,
        audio_object_type: AudioObjectType::Mpeg4LowComplexity,
    };
    Encoder::new(params).map_err(|e| EncoderError::CodecUnavailable(format!("fdk-aac open failed: {:?}", e)))
}

/// AudioSpecificConfig reported by the encoder, when it offers one.
fn read_magic_cookie(encoder: &Encoder) -> Option<Bytes> {
    match encoder.info() {
        Ok(info) => {
            let len = (info.confSize as usize).min(info.confBuf.len());
            (len > 0).then(|| Bytes::copy_from_slice(&info.confBuf[..len]))
        }
        Err(e) => {
            log::warn!("fdk-aac info unavailable: {:?}", e);
            None
        }
    }
}
