use serde::{Deserialize, Serialize};

use crate::processing::priming::PrimingPolicy;

/// Per-channel bitrate used until the caller asks for something else.
pub const DEFAULT_BITRATE: u32 = 32 * 1024;

/// Lowest per-channel bitrate the controller will commit.
pub const MINIMUM_BITRATE: u32 = 8 * 1024;

/// Amount the controller retreats by after each rejection.
pub const BITRATE_STEP: u32 = 8 * 1024;

/// Encoder core configuration.
///
/// `channels` and `sample_rate` use 0 to mean "inherit from the first source buffer".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfiguration {
    /// Target bitrate per destination channel, in bits per second.
    pub bitrate: u32,

    pub minimum_bitrate: u32,

    pub bitrate_step: u32,

    /// Replace input with silence while keeping sizes and timing.
    pub muted: bool,

    /// Destination channel count (default 1; 0 = inherit).
    pub channels: u32,

    /// Destination sample rate in Hz (default 0 = inherit).
    pub sample_rate: u32,

    pub priming: PrimingPolicy,
}

impl EncoderConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.minimum_bitrate == 0 {
            return Err("minimum bitrate must be positive".into());
        }
        if self.bitrate_step == 0 {
            return Err("bitrate step must be positive".into());
        }
        if self.bitrate < self.minimum_bitrate {
            return Err(format!(
                "bitrate {} is below the minimum {}",
                self.bitrate, self.minimum_bitrate
            ));
        }
        if self.channels > 2 {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        Ok(())
    }
}

impl Default for EncoderConfiguration {
    fn default() -> Self {
        Self {
            bitrate: DEFAULT_BITRATE,
            minimum_bitrate: MINIMUM_BITRATE,
            bitrate_step: BITRATE_STEP,
            muted: false,
            channels: 1,
            sample_rate: 0,
            priming: PrimingPolicy::default(),
        }
    }
}

/// Configuration for a capture-to-writer conversion session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    pub encoder: EncoderConfiguration,

    /// Packets discarded before anything reaches the writer, while capture settles.
    pub skip_leading_packets: u32,

    /// Write `{artifact}.metadata.json` next to the finished artifact.
    pub write_metadata_sidecar: bool,
}

impl SessionConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        self.encoder.validate()
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            encoder: EncoderConfiguration::default(),
            skip_leading_packets: 0,
            write_metadata_sidecar: false,
        }
    }
}
