use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::EncoderError;
use crate::models::session_result::SessionMetadata;

/// `{artifact}.metadata.json`, next to the artifact.
pub fn metadata_path(artifact_path: &Path) -> PathBuf {
    let mut name = artifact_path.as_os_str().to_owned();
    name.push(".metadata.json");
    PathBuf::from(name)
}

/// Write session metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &SessionMetadata, artifact_path: &Path) -> Result<(), EncoderError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| EncoderError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(artifact_path), json)
        .map_err(|e| EncoderError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read session metadata from a JSON sidecar file.
pub fn read_metadata(artifact_path: &Path) -> Result<SessionMetadata, EncoderError> {
    let json = fs::read_to_string(metadata_path(artifact_path))
        .map_err(|e| EncoderError::StorageError(format!("failed to read metadata: {}", e)))?;
    let metadata: SessionMetadata = serde_json::from_str(&json)
        .map_err(|e| EncoderError::StorageError(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}
