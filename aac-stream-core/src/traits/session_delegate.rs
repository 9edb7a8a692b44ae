use std::path::Path;

use crate::models::error::EncoderError;
use crate::models::session_result::SessionResult;
use crate::models::state::SessionState;

/// Event delegate for conversion session notifications.
///
/// Methods are called from whichever thread drove the transition; marshal to
/// a UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &SessionState);

    /// Called when a lifecycle step fails.
    fn on_error(&self, error: &EncoderError);

    /// Called once the writer has finalized the artifact at `location`.
    fn did_finish_writing(&self, location: &Path, result: &SessionResult);
}
