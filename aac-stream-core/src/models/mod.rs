pub mod audio_models;
pub mod config;
pub mod error;
pub mod format;
pub mod packet;
pub mod raw_buffer;
pub mod sample_buffer;
pub mod session_result;
pub mod state;
pub mod time;
