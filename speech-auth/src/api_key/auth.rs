//! API key authentication trait and implementation.

use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{api_key_error, ApiKeyErrorKind, Error};

/// Prefix SpeechKit expects in front of a service account API key.
pub const API_KEY_PREFIX: &str = "Api-Key";

/// Trait for producing the authentication header attached to every request.
///
/// The HTTP client builder installs the header as a sensitive default header,
/// so implementations are consulted once per client rather than per request.
pub trait ProviderAuth: Send + Sync {
    /// Build the `(name, value)` header pair carrying the credentials.
    fn header(&self) -> Result<(HeaderName, HeaderValue), Error>;
}

/// API key authentication implementation.
///
/// # Examples
///
/// ```rust,ignore
/// // SpeechKit: Authorization: Api-Key xxx
/// let auth = ApiKeyAuth::new(SecretString::new("api_key_here".to_string()), API_KEY_PREFIX);
/// ```
pub struct ApiKeyAuth {
    api_key: SecretString,
    header_name: HeaderName,
    prefix: Option<String>,
}

impl ApiKeyAuth {
    /// Create a new API key authenticator sending the key in `Authorization`.
    ///
    /// # Arguments
    ///
    /// * `api_key` - The API key (stored securely)
    /// * `prefix` - Optional prefix for the authorization value (e.g., "Api-Key")
    pub fn new(api_key: SecretString, prefix: &str) -> Self {
        let prefix = Some(prefix.trim().to_string()).filter(|p| !p.is_empty());

        Self {
            api_key,
            header_name: AUTHORIZATION,
            prefix,
        }
    }

    /// Authenticator for the SpeechKit and Operation APIs.
    pub fn speechkit(api_key: SecretString) -> Self {
        Self::new(api_key, API_KEY_PREFIX)
    }

    fn auth_value(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{} {}", prefix, self.api_key.expose_secret()),
            None => self.api_key.expose_secret().to_string(),
        }
    }
}

impl ProviderAuth for ApiKeyAuth {
    fn header(&self) -> Result<(HeaderName, HeaderValue), Error> {
        let mut value = HeaderValue::from_str(&self.auth_value()).map_err(|_| {
            api_key_error(
                ApiKeyErrorKind::InvalidFormat,
                "API key is not a valid header value",
            )
        })?;
        value.set_sensitive(true);

        Ok((self.header_name.clone(), value))
    }
}
