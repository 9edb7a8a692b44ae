pub mod audio_session;
pub mod capture_source;
pub mod codec;
pub mod codec_candidate;
pub mod container_writer;
pub mod packet_sink;
pub mod session_delegate;
