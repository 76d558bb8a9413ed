//! Speech recognition abstraction layer for storage and transcription providers.
//!
//! This crate provides trait-based abstractions for long-running recognition workflows:
//! - Object storage that holds the audio while the provider reads it
//! - Speech-to-text providers driven through an operation handle that is polled
//!   until the job finishes
//!
//! The design is provider-agnostic so the polling and cleanup logic can be exercised
//! against in-memory storage and mocked providers.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::Error;
