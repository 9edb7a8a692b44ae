use serde::{Deserialize, Serialize};

use super::error::EncoderError;
use super::session_result::SessionResult;

/// Where the encode driver is within one input buffer.
///
/// ```text
/// Idle → Converting → Draining → Idle
///            └───────────────────↗  (error or no output)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodePhase {
    #[default]
    Idle,
    /// The staged input has not been consumed by the codec yet.
    Converting,
    /// Input is consumed; still collecting output until the codec runs dry.
    Draining,
}

/// Conversion session state machine.
///
/// State transitions:
/// ```text
/// idle → starting → running → finishing → completed → idle
///            ↓          ↓          ↓
///          failed     failed     failed
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Starting,
    Running,
    Finishing,
    Completed(Box<SessionResult>),
    Failed(EncoderError),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    /// Whether `start()` may be called from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Completed(_) | Self::Failed(_))
    }
}
