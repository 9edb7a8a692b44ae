use crate::models::error::EncoderError;
use crate::models::format::{SourceFormat, AAC_FRAMES_PER_PACKET};
use crate::models::raw_buffer::RawBufferList;
use crate::models::sample_buffer::PcmSampleBuffer;

/// Owns the input staging buffer list for the lifetime of a running interval.
///
/// The list is reallocated only when the number of buffers the source format
/// needs changes (interleaved ↔ planar, or a planar channel count change).
/// Byte capacity inside each buffer grows on demand and is otherwise reused.
#[derive(Debug)]
pub struct RawBufferPool {
    staging: RawBufferList,
    allocations: u64,
}

impl RawBufferPool {
    pub fn new() -> Self {
        Self {
            staging: RawBufferList::allocate(1, 1, 0),
            allocations: 1,
        }
    }

    /// Resize the staging list for `format`. Returns true if it was reallocated.
    pub fn ensure_capacity(&mut self, format: &SourceFormat) -> bool {
        let count = format.buffer_count();
        let channels_per_buffer = format.channels_per_buffer();
        let reallocated = count != self.staging.len();

        if reallocated {
            // Free the previous list before allocating its replacement.
            drop(std::mem::take(&mut self.staging));
            let bytes_per_buffer = format.bytes_per_frame as usize * AAC_FRAMES_PER_PACKET as usize;
            self.staging = RawBufferList::allocate(count, channels_per_buffer, bytes_per_buffer);
            self.allocations += 1;
            log::debug!(
                "staging buffers reallocated: {} x {} bytes",
                count,
                bytes_per_buffer
            );
        } else {
            for buffer in self.staging.iter_mut() {
                buffer.set_channels(channels_per_buffer);
            }
        }
        reallocated
    }

    /// Copy the planes of `buffer` into the staging list. Returns the bytes staged.
    pub fn stage(&mut self, buffer: &PcmSampleBuffer) -> Result<usize, EncoderError> {
        let planes = buffer.planes();
        if planes.len() != self.staging.len() {
            return Err(EncoderError::InvalidFormat(format!(
                "buffer has {} planes but staging holds {}",
                planes.len(),
                self.staging.len()
            )));
        }
        for (target, plane) in self.staging.iter_mut().zip(planes) {
            target.fill_from(plane);
        }
        Ok(self.staging.total_bytes())
    }

    /// The staging list, as last filled.
    pub fn current_buffers(&self) -> &RawBufferList {
        &self.staging
    }

    pub fn current_buffers_mut(&mut self) -> &mut RawBufferList {
        &mut self.staging
    }

    pub fn buffer_count(&self) -> usize {
        self.staging.len()
    }

    /// How many times a staging list has been allocated, including the first.
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }
}

impl Default for RawBufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::time::MediaTime;

    #[test]
    fn interleaved_uses_one_buffer() {
        let mut pool = RawBufferPool::new();
        let reallocated = pool.ensure_capacity(&SourceFormat::interleaved_i16(44100.0, 2));
        assert!(!reallocated);
        assert_eq!(pool.buffer_count(), 1);
        assert_eq!(pool.current_buffers().buffer(0).unwrap().channels(), 2);
        assert_eq!(pool.allocation_count(), 1);
    }

    #[test]
    fn planar_uses_one_buffer_per_channel() {
        let mut pool = RawBufferPool::new();
        assert!(pool.ensure_capacity(&SourceFormat::planar_f32(48000.0, 2)));
        assert_eq!(pool.buffer_count(), 2);
        assert_eq!(pool.allocation_count(), 2);
        assert_eq!(pool.current_buffers().buffer(1).unwrap().capacity(), 4 * 1024);
    }

    #[test]
    fn reallocates_only_when_count_changes() {
        let mut pool = RawBufferPool::new();
        assert!(pool.ensure_capacity(&SourceFormat::planar_f32(48000.0, 2)));
        assert!(!pool.ensure_capacity(&SourceFormat::planar_f32(44100.0, 2)));
        assert!(pool.ensure_capacity(&SourceFormat::planar_f32(48000.0, 3)));
        assert!(pool.ensure_capacity(&SourceFormat::interleaved_f32(48000.0, 3)));
        // mono interleaved and stereo interleaved both need a single buffer
        assert!(!pool.ensure_capacity(&SourceFormat::interleaved_i16(48000.0, 1)));
        assert_eq!(pool.allocation_count(), 4);
    }

    #[test]
    fn stage_copies_every_plane() {
        let format = SourceFormat::planar_f32(48000.0, 2);
        let mut pool = RawBufferPool::new();
        pool.ensure_capacity(&format);

        let planes = vec![
            bytes::Bytes::from(vec![1u8; 8]),
            bytes::Bytes::from(vec![2u8; 8]),
        ];
        let buffer = PcmSampleBuffer::planar(format, MediaTime::new(0, 48000), planes).unwrap();
        assert_eq!(pool.stage(&buffer).unwrap(), 16);

        let staged = pool.current_buffers();
        assert_eq!(staged.buffer(0).unwrap().bytes(), &[1u8; 8]);
        assert_eq!(staged.buffer(1).unwrap().bytes(), &[2u8; 8]);
    }

    #[test]
    fn stage_rejects_geometry_mismatch() {
        let mut pool = RawBufferPool::new();
        pool.ensure_capacity(&SourceFormat::interleaved_i16(44100.0, 2));

        let planar = SourceFormat::planar_f32(44100.0, 2);
        let buffer = PcmSampleBuffer::silence(planar, MediaTime::new(0, 44100), 4).unwrap();
        assert!(pool.stage(&buffer).is_err());
    }
}
