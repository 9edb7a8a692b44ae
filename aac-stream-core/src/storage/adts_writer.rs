use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::error::EncoderError;
use crate::models::format::{AacTransport, FormatDescriptor};
use crate::models::packet::EncodedPacket;
use crate::models::time::MediaTime;
use crate::processing::adts;
use crate::traits::container_writer::ContainerWriter;

/// Streaming `.aac` (ADTS elementary stream) writer.
///
/// Raw access units are framed with a 7-byte ADTS header; packets that are
/// already ADTS-framed are written unchanged. ADTS has no edit list, so trim
/// annotations are not persisted; they are reported through the session
/// metadata instead.
///
/// ## File Format
///
/// ```text
/// [ADTS header | access unit 1]
/// [ADTS header | access unit 2]
/// ...
/// ```
pub struct AdtsFileWriter {
    file_path: PathBuf,
    file: Option<BufWriter<File>>,
    format: Option<FormatDescriptor>,
    start_time: MediaTime,
    total_bytes_written: u64,
    frames_written: u64,
}

impl AdtsFileWriter {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            file: None,
            format: None,
            start_time: MediaTime::INVALID,
            total_bytes_written: 0,
            frames_written: 0,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Timeline origin passed to `start_session`.
    pub fn start_time(&self) -> MediaTime {
        self.start_time
    }

    /// Access units written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn open(&mut self) -> Result<(), EncoderError> {
        if self.file.is_some() {
            return Ok(());
        }
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| EncoderError::StorageError(format!("failed to create directory: {}", e)))?;
        }
        let file = File::create(&self.file_path)
            .map_err(|e| EncoderError::StorageError(format!("failed to create file: {}", e)))?;
        self.file = Some(BufWriter::new(file));
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), EncoderError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| EncoderError::StorageError("file is not open".into()))?;
        file.write_all(data)
            .map_err(|e| EncoderError::StorageError(format!("write failed: {}", e)))?;
        self.total_bytes_written += data.len() as u64;
        Ok(())
    }
}

impl ContainerWriter for AdtsFileWriter {
    fn start_session(&mut self, format: &FormatDescriptor, start_time: MediaTime) -> Result<(), EncoderError> {
        let destination = format.destination;
        if format.transport == AacTransport::Raw
            && adts::adts_header(destination.object_type, destination.sample_rate, destination.channels, 0)
                .is_none()
        {
            return Err(EncoderError::InvalidFormat(format!(
                "{} Hz, {} channels cannot be framed as ADTS",
                destination.sample_rate, destination.channels
            )));
        }
        self.open()?;
        self.format = Some(format.clone());
        self.start_time = start_time;
        Ok(())
    }

    fn append(&mut self, packet: &EncodedPacket) -> Result<(), EncoderError> {
        let transport = self
            .format
            .as_ref()
            .map(|f| f.transport)
            .ok_or_else(|| EncoderError::StorageError("session not started".into()))?;

        match transport {
            AacTransport::Adts => self.write_raw(&packet.data)?,
            AacTransport::Raw => {
                let destination = packet.format.destination;
                let header = adts::adts_header(
                    destination.object_type,
                    destination.sample_rate,
                    destination.channels,
                    packet.data.len(),
                )
                .ok_or_else(|| {
                    EncoderError::StorageError(format!(
                        "access unit of {} bytes does not fit an ADTS frame",
                        packet.data.len()
                    ))
                })?;
                self.write_raw(&header)?;
                self.write_raw(&packet.data)?;
            }
        }
        self.frames_written += packet.packet_count as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<PathBuf, EncoderError> {
        // A session that never received a packet still leaves an (empty) artifact.
        self.open()?;
        if let Some(mut file) = self.file.take() {
            file.flush()
                .map_err(|e| EncoderError::StorageError(format!("flush failed: {}", e)))?;
        }
        Ok(self.file_path.clone())
    }

    fn bytes_written(&self) -> u64 {
        self.total_bytes_written
    }
}
