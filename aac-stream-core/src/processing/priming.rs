use serde::{Deserialize, Serialize};

use crate::models::format::DestinationFormat;
use crate::models::time::MediaTime;

/// Encoder lookahead trimmed after the full-packet priming.
pub const DEFAULT_LOOKAHEAD_FRAMES: u32 = 64;

/// Which leading packets carry a trim-at-start annotation, and how much.
///
/// The values depend on the codec's real priming delay and should be checked
/// against the encoder in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimingPolicy {
    /// Leading packets trimmed by a whole packet (frames-per-packet).
    pub full_packet_trims: u32,
    /// Trim on the packet after those, in frames. Zero disables it.
    pub lookahead_frames: u32,
}

impl PrimingPolicy {
    /// No trim annotations at all.
    pub const NONE: PrimingPolicy = PrimingPolicy {
        full_packet_trims: 0,
        lookahead_frames: 0,
    };

    /// Trim for the packet at `index` (0-based, counted per running interval).
    pub fn trim_for(&self, index: u64, destination: &DestinationFormat) -> Option<MediaTime> {
        let full = self.full_packet_trims as u64;
        if index < full {
            Some(destination.frames(destination.frames_per_packet))
        } else if index == full && self.lookahead_frames > 0 {
            Some(destination.frames(self.lookahead_frames))
        } else {
            None
        }
    }

    /// Total frames trimmed across all annotated packets.
    pub fn total_frames(&self, frames_per_packet: u32) -> u32 {
        self.full_packet_trims * frames_per_packet + self.lookahead_frames
    }
}

impl Default for PrimingPolicy {
    fn default() -> Self {
        Self {
            full_packet_trims: 1,
            lookahead_frames: DEFAULT_LOOKAHEAD_FRAMES,
        }
    }
}

/// Counts emitted packets so each gets the right annotation.
#[derive(Debug, Clone, Default)]
pub struct PrimingTracker {
    emitted: u64,
}

impl PrimingTracker {
    /// Annotation for the next packet; advances the count.
    pub fn next(&mut self, policy: &PrimingPolicy, destination: &DestinationFormat) -> Option<MediaTime> {
        let trim = policy.trim_for(self.emitted, destination);
        self.emitted += 1;
        trim
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn reset(&mut self) {
        self.emitted = 0;
    }
}
