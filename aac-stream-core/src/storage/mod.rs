pub mod adts_writer;
pub mod metadata;
