use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Rational media time: `value / timescale` seconds.
///
/// A timescale of zero marks an invalid time (no timestamp attached).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaTime {
    pub value: i64,
    pub timescale: i32,
}

impl MediaTime {
    pub const INVALID: MediaTime = MediaTime {
        value: 0,
        timescale: 0,
    };

    pub const fn new(value: i64, timescale: i32) -> Self {
        Self { value, timescale }
    }

    pub fn is_valid(&self) -> bool {
        self.timescale > 0
    }

    /// Time in seconds, or NaN for an invalid time.
    pub fn seconds(&self) -> f64 {
        if !self.is_valid() {
            return f64::NAN;
        }
        self.value as f64 / self.timescale as f64
    }

    /// Re-expresses this time in another timescale, rounding toward zero.
    pub fn convert_scale(&self, timescale: i32) -> Self {
        if !self.is_valid() || timescale <= 0 {
            return Self::INVALID;
        }
        if timescale == self.timescale {
            return *self;
        }
        let value = (self.value as i128 * timescale as i128) / self.timescale as i128;
        Self::new(value as i64, timescale)
    }

    /// Adds `other`, converting it to this time's timescale first.
    pub fn checked_add(&self, other: MediaTime) -> Option<Self> {
        if !self.is_valid() || !other.is_valid() {
            return None;
        }
        let other = other.convert_scale(self.timescale);
        self.value
            .checked_add(other.value)
            .map(|value| Self::new(value, self.timescale))
    }

    /// `self * factor`, keeping the timescale.
    pub fn scaled(&self, factor: i64) -> Self {
        if !self.is_valid() {
            return Self::INVALID;
        }
        Self::new(self.value.saturating_mul(factor), self.timescale)
    }

    /// Compares two times by their real value, regardless of timescale.
    ///
    /// Invalid times are unordered against everything but themselves.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self.is_valid(), other.is_valid()) {
            (true, true) => {
                let lhs = self.value as i128 * other.timescale as i128;
                let rhs = other.value as i128 * self.timescale as i128;
                Some(lhs.cmp(&rhs))
            }
            (false, false) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl Default for MediaTime {
    fn default() -> Self {
        Self::INVALID
    }
}
