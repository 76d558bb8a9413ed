//! API key authentication for the recognition and operation endpoints.

mod auth;

pub use auth::{ApiKeyAuth, ProviderAuth};
