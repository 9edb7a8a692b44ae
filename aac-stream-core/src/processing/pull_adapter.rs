use crate::models::raw_buffer::RawBufferList;
use crate::traits::codec::{InputProvider, PullStatus};

/// The single staged input slot between the encode driver and the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingInput {
    /// Nothing staged, or the staged buffer was already served.
    #[default]
    Empty,
    /// A buffer is staged and has not been handed to the codec.
    Filled,
}

impl PendingInput {
    /// Mark freshly staged input. Only legal from `Empty`.
    pub fn fill(&mut self) -> bool {
        match self {
            Self::Empty => {
                *self = Self::Filled;
                true
            }
            Self::Filled => false,
        }
    }

    /// Take the staged input. Returns false if there was none.
    pub fn consume(&mut self) -> bool {
        match self {
            Self::Filled => {
                *self = Self::Empty;
                true
            }
            Self::Empty => false,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Self::Filled)
    }

    pub fn reset(&mut self) {
        *self = Self::Empty;
    }
}

/// Serves the staged buffer to the codec exactly once per encode pass.
///
/// The first pull returns the staging list and empties the slot; every later
/// pull reports exhaustion until the driver stages new input.
pub struct PullAdapter<'a> {
    staging: &'a RawBufferList,
    slot: &'a mut PendingInput,
    pulls: u32,
}

impl<'a> PullAdapter<'a> {
    pub fn new(staging: &'a RawBufferList, slot: &'a mut PendingInput) -> Self {
        Self {
            staging,
            slot,
            pulls: 0,
        }
    }

    /// Pulls made through this adapter, served or not.
    pub fn pulls(&self) -> u32 {
        self.pulls
    }

    pub fn is_consumed(&self) -> bool {
        !self.slot.is_filled()
    }
}

impl InputProvider for PullAdapter<'_> {
    fn pull_input(&mut self) -> PullStatus<'_> {
        self.pulls += 1;
        if self.slot.consume() {
            PullStatus::Packet(self.staging)
        } else {
            PullStatus::Exhausted
        }
    }
}
