//! # speech-auth
//!
//! Authentication and HTTP plumbing for the speech recognition services:
//! - API key authentication (`Authorization: Api-Key <key>`)
//! - HTTP client building with retry middleware
//!
//! ## Usage
//!
//! ```rust,ignore
//! use speech_auth::{
//!     api_key::{ApiKeyAuth, ProviderAuth},
//!     http::AuthenticatedClientBuilder,
//! };
//! ```

pub mod api_key;
pub mod error;
pub mod http;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
