pub mod adts;
pub mod bitrate;
pub mod buffer_pool;
pub mod format_negotiator;
pub mod pcm;
pub mod priming;
pub mod pull_adapter;
