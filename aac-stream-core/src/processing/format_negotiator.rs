use std::sync::Arc;

use crate::models::config::EncoderConfiguration;
use crate::models::error::EncoderError;
use crate::models::format::{
    DestinationFormat, FormatDescriptor, SourceFormat, DEFAULT_DESTINATION_SAMPLE_RATE,
};
use crate::traits::codec::AudioCodec;
use crate::traits::codec_candidate::CodecCandidate;

/// How an incoming buffer's format relates to the captured source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatObservation {
    /// First buffer of the running interval; its format is now authoritative.
    First,
    Unchanged,
    /// Same layout at a different rate; the stored parameters stay in use.
    RateChanged,
    /// Different channel count or sample layout; the buffer cannot be staged.
    GeometryChanged,
}

/// Derives the destination format and builds the codec.
///
/// The source format is captured from the first buffer after start and is
/// immutable until `reset`.
pub struct FormatNegotiator {
    channels: u32,
    sample_rate: u32,
    candidates: Vec<Box<dyn CodecCandidate>>,
    source: Option<SourceFormat>,
    destination: Option<DestinationFormat>,
    descriptor: Option<Arc<FormatDescriptor>>,
    rate_change_logged: bool,
    geometry_change_logged: bool,
}

impl FormatNegotiator {
    pub fn new(config: &EncoderConfiguration, candidates: Vec<Box<dyn CodecCandidate>>) -> Self {
        Self {
            channels: config.channels,
            sample_rate: config.sample_rate,
            candidates,
            source: None,
            destination: None,
            descriptor: None,
            rate_change_logged: false,
            geometry_change_logged: false,
        }
    }

    /// Record `format` if none is stored yet; otherwise classify the difference.
    pub fn observe_first_input(&mut self, format: &SourceFormat) -> FormatObservation {
        let Some(source) = self.source else {
            log::info!(
                "source format: {} Hz, {} ch, {} bit {:?}, {}",
                format.sample_rate,
                format.channels,
                format.bits_per_channel,
                format.sample_kind,
                if format.interleaved { "interleaved" } else { "planar" }
            );
            self.source = Some(*format);
            return FormatObservation::First;
        };

        if !source.same_geometry(format) {
            if !self.geometry_change_logged {
                self.geometry_change_logged = true;
                log::warn!(
                    "source layout changed mid-session ({} ch -> {} ch); dropping mismatched buffers",
                    source.channels,
                    format.channels
                );
            }
            FormatObservation::GeometryChanged
        } else if (source.sample_rate - format.sample_rate).abs() > f64::EPSILON {
            if !self.rate_change_logged {
                self.rate_change_logged = true;
                log::warn!(
                    "source rate changed mid-session ({} -> {} Hz); keeping original parameters",
                    source.sample_rate,
                    format.sample_rate
                );
            }
            FormatObservation::RateChanged
        } else {
            FormatObservation::Unchanged
        }
    }

    pub fn source_format(&self) -> Option<&SourceFormat> {
        self.source.as_ref()
    }

    /// The cached destination format, derived on first access.
    pub fn destination_format(&mut self) -> DestinationFormat {
        if let Some(destination) = self.destination {
            return destination;
        }

        let channels = match (self.channels, self.source) {
            (0, Some(source)) => source.channels.min(2),
            (0, None) => 1,
            (channels, _) => channels,
        };
        let sample_rate = match (self.sample_rate, self.source) {
            (0, Some(source)) => source.sample_rate.round() as u32,
            (0, None) => DEFAULT_DESTINATION_SAMPLE_RATE,
            (rate, _) => rate,
        };

        let destination = DestinationFormat::aac_lc(sample_rate, channels);
        self.destination = Some(destination);
        destination
    }

    /// Try each candidate in order and return the first codec that builds.
    pub fn build_codec(
        &self,
        source: &SourceFormat,
        destination: &DestinationFormat,
    ) -> Result<Box<dyn AudioCodec>, EncoderError> {
        let mut failures = Vec::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            match candidate.build(source, destination) {
                Ok(codec) => {
                    log::info!(
                        "codec '{}' built: {} Hz, {} ch, {} frames/packet",
                        codec.name(),
                        destination.sample_rate,
                        destination.channels,
                        destination.frames_per_packet
                    );
                    return Ok(codec);
                }
                Err(e) => {
                    log::warn!("codec candidate '{}' failed: {}", candidate.name(), e);
                    failures.push(format!("{}: {}", candidate.name(), e));
                }
            }
        }
        if failures.is_empty() {
            return Err(EncoderError::CodecUnavailable("no codec candidates registered".into()));
        }
        Err(EncoderError::CodecUnavailable(failures.join("; ")))
    }

    /// Build and cache the output descriptor for `codec`.
    pub fn describe(&mut self, codec: &dyn AudioCodec) -> Arc<FormatDescriptor> {
        let destination = self.destination_format();
        let descriptor = Arc::new(
            FormatDescriptor::new(destination, codec.transport()).with_magic_cookie(codec.magic_cookie()),
        );
        self.descriptor = Some(Arc::clone(&descriptor));
        descriptor
    }

    pub fn descriptor(&self) -> Option<Arc<FormatDescriptor>> {
        self.descriptor.clone()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Drop the cached source, destination, and descriptor.
    pub fn reset(&mut self) {
        self.source = None;
        self.destination = None;
        self.descriptor = None;
        self.rate_change_logged = false;
        self.geometry_change_logged = false;
    }
}
