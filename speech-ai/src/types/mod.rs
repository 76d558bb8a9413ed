//! Provider-agnostic data types.

pub mod recognition;
pub mod storage;
