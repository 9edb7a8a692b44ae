//! # aac-stream-fdk
//!
//! fdk-aac backend for aac-stream-core.
//!
//! Provides:
//! - `FdkAacCodec`: AAC-LC encoder implementing the core's pull-based `AudioCodec`
//! - `FdkAacCandidate`: codec candidates for the format negotiator, raw access
//!   units (preferred) or ADTS-framed (fallback)
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use aac_stream_core::{AudioEncoder, EncoderConfiguration};
//!
//! let (tx, rx) = crossbeam_channel::unbounded();
//! let encoder = AudioEncoder::new(
//!     EncoderConfiguration::default(),
//!     aac_stream_fdk::default_candidates(),
//!     Arc::new(tx),
//! )?;
//! encoder.start_running()?;
//! ```

pub mod candidate;
pub mod codec;

pub use candidate::{default_candidates, FdkAacCandidate};
pub use codec::FdkAacCodec;
