//! Provider traits.

pub mod storage;
pub mod transcription;
