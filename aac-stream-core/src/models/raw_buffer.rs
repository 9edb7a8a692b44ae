/// One contiguous chunk of audio bytes plus the number of channels it carries.
///
/// `capacity()` is the allocated size; `len()` is how many bytes are valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBuffer {
    channels: u32,
    data: Vec<u8>,
    len: usize,
}

impl RawBuffer {
    pub fn with_capacity(channels: u32, capacity: usize) -> Self {
        Self {
            channels,
            data: vec![0; capacity],
            len: 0,
        }
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn set_channels(&mut self, channels: u32) {
        self.channels = channels;
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The valid bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The whole allocation, for producers that write first and report the length after.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Marks the first `len` bytes as valid, clamped to the capacity.
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(self.data.len());
    }

    /// Replaces the contents with `src`, growing the allocation only when it is too small.
    pub fn fill_from(&mut self, src: &[u8]) {
        if src.len() > self.data.len() {
            self.data.resize(src.len(), 0);
        }
        self.data[..src.len()].copy_from_slice(src);
        self.len = src.len();
    }

    /// Overwrites the valid bytes with silence, keeping the length.
    pub fn zero(&mut self) {
        self.data[..self.len].fill(0);
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// Channel-indexed set of raw buffers describing one chunk of PCM or codec output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBufferList {
    buffers: Vec<RawBuffer>,
}

impl RawBufferList {
    /// Allocates `count` buffers of `bytes_per_buffer` bytes each.
    pub fn allocate(count: usize, channels_per_buffer: u32, bytes_per_buffer: usize) -> Self {
        Self {
            buffers: (0..count)
                .map(|_| RawBuffer::with_capacity(channels_per_buffer, bytes_per_buffer))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn buffer(&self, index: usize) -> Option<&RawBuffer> {
        self.buffers.get(index)
    }

    pub fn buffer_mut(&mut self, index: usize) -> Option<&mut RawBuffer> {
        self.buffers.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawBuffer> {
        self.buffers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RawBuffer> {
        self.buffers.iter_mut()
    }

    /// Sum of valid bytes across all buffers.
    pub fn total_bytes(&self) -> usize {
        self.buffers.iter().map(RawBuffer::len).sum()
    }

    /// Silences every buffer in place.
    pub fn zero(&mut self) {
        for buffer in &mut self.buffers {
            buffer.zero();
        }
    }

    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }
}
