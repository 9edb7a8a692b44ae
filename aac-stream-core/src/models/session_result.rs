use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result returned when a conversion session finishes writing.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub location: PathBuf,
    pub duration_secs: f64,
    pub metadata: SessionMetadata,
    pub checksum: String,
}

/// Metadata describing a finished artifact.
///
/// Serializable for the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub id: String,
    pub created_at: String,
    pub location: String,
    pub duration_secs: f64,
    pub checksum: String,
    pub packets_written: u64,
    pub bytes_written: u64,
    pub sample_rate: u32,
    pub channels: u32,
    pub bitrate: u32,
    pub priming_frames: u32,
}

impl SessionMetadata {
    /// Creates metadata stamped with a fresh id and the current time.
    pub fn new(location: &str, checksum: &str, stats: &StreamStats) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            location: location.to_string(),
            duration_secs: stats.duration_secs(),
            checksum: checksum.to_string(),
            packets_written: stats.packets_written,
            bytes_written: stats.bytes_written,
            sample_rate: stats.sample_rate,
            channels: stats.channels,
            bitrate: stats.bitrate,
            priming_frames: stats.priming_frames,
        }
    }
}

/// Running totals collected while packets are appended to the writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub packets_written: u64,
    pub frames_written: u64,
    pub bytes_written: u64,
    pub sample_rate: u32,
    pub channels: u32,
    pub bitrate: u32,
    pub priming_frames: u32,
}

impl StreamStats {
    /// Playable duration: written frames minus the trimmed priming.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let frames = self.frames_written.saturating_sub(self.priming_frames as u64);
        frames as f64 / self.sample_rate as f64
    }
}
