//! Authenticated HTTP client builder with middleware.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest_middleware::ClientBuilder;
use reqwest_retry::RetryTransientMiddleware;

use super::BackoffPolicy;
use crate::api_key::ProviderAuth;
use crate::error::Error;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub(crate) struct HttpClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further attempt.
    pub retry_base_delay: Duration,
    /// Upper bound for the delay between retries.
    pub retry_max_delay: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(60),
            user_agent: format!("speech-auth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Authenticated HTTP client with middleware.
pub type AuthenticatedClient = reqwest_middleware::ClientWithMiddleware;

/// Builder for creating authenticated HTTP clients with middleware.
///
/// Provides a fluent API for constructing HTTP clients with:
/// - Authentication installed as a sensitive default header
/// - JSON content type
/// - Retry logic with exponential backoff
/// - Timeout configuration
pub struct AuthenticatedClientBuilder {
    config: HttpClientConfig,
    auth: Option<Box<dyn ProviderAuth>>,
}

impl AuthenticatedClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
            auth: None,
        }
    }

    /// Set the authentication provider.
    pub fn with_auth(mut self, auth: Box<dyn ProviderAuth>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the backoff delays used between retries.
    pub fn with_retry_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.config.retry_base_delay = base_delay;
        self.config.retry_max_delay = max_delay;
        self
    }

    /// Build the configured HTTP client.
    ///
    /// # Returns
    ///
    /// An authenticated HTTP client with middleware configured, or an error if the
    /// credentials cannot be encoded as a header or the TLS backend fails to load.
    pub fn build(self) -> Result<AuthenticatedClient, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(auth) = &self.auth {
            let (name, value) = auth.header()?;
            headers.insert(name, value);
        }

        // Build the base reqwest client
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent)
            .default_headers(headers)
            .build()?;

        let retry_policy = BackoffPolicy::new(self.config.max_retries)
            .with_delays(self.config.retry_base_delay, self.config.retry_max_delay);
        let client_with_middleware = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(client_with_middleware)
    }
}

impl Default for AuthenticatedClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_key::ApiKeyAuth;
    use secrecy::SecretString;

    #[test]
    fn test_builder_default() {
        let builder = AuthenticatedClientBuilder::new();
        assert_eq!(builder.config.timeout, Duration::from_secs(30));
        assert_eq!(builder.config.max_retries, 3);
    }

    #[test]
    fn test_builder_with_timeout() {
        let builder = AuthenticatedClientBuilder::new().with_timeout(Duration::from_secs(60));
        assert_eq!(builder.config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_with_max_retries() {
        let builder = AuthenticatedClientBuilder::new().with_max_retries(5);
        assert_eq!(builder.config.max_retries, 5);
    }

    #[tokio::test]
    async fn test_build_client() {
        let builder = AuthenticatedClientBuilder::new();
        let result = builder.build();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_client_sends_api_key_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/operations/op-1")
            .match_header("authorization", "Api-Key secret-key")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"{"done":false}"#)
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new()
            .with_auth(Box::new(ApiKeyAuth::speechkit(SecretString::new(
                "secret-key".to_string(),
            ))))
            .build()
            .unwrap();

        let response = client
            .get(format!("{}/operations/op-1", server.url()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/operations/op-1")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new()
            .with_max_retries(2)
            .with_retry_delays(Duration::from_millis(1), Duration::from_millis(5))
            .build()
            .unwrap();

        let response = client
            .get(format!("{}/operations/op-1", server.url()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 503);
        mock.assert_async().await;
    }
}
