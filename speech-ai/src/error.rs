//! Error types for speech recognition operations.

use std::fmt;

/// Universal error type that abstracts provider-specific errors into common variants.
///
/// Provider and storage implementations map their native errors to these variants,
/// preserving context while keeping the poller provider-agnostic. The poller relies
/// on [`Error::is_transient`] to decide whether a failed status query may be retried.
#[derive(Debug)]
pub enum Error {
    /// Network connectivity issues, DNS failures, or refused connections.
    /// These errors are typically transient and may benefit from retry logic.
    Network(String),

    /// A single request exceeded the client-side timeout.
    Timeout(String),

    /// Missing credentials or malformed configuration.
    /// Detected before any I/O is attempted.
    Configuration(String),

    /// The local audio file could not be read.
    Io(String),

    /// Transport or authorization failure while talking to object storage.
    Upload(String),

    /// The recognition service rejected the job submission.
    /// Carries the HTTP status and raw body for diagnostics.
    Submission { status: u16, body: String },

    /// A status query returned a non-success HTTP status.
    /// Server errors and throttling are transient; other statuses are not.
    UnexpectedStatus { status: u16, body: String },

    /// The provider reported the operation itself as failed.
    Provider(String),

    /// Payload was not JSON or did not have the expected shape.
    Deserialization(String),

    /// Catch-all for errors that don't fit other categories.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Whether repeating the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout(_) => true,
            Error::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Network(msg) => write!(f, "Network error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
            Error::Upload(msg) => write!(f, "Upload failed: {}", msg),
            Error::Submission { status, body } => {
                write!(f, "Submission rejected: StatusCode: {}, Body: {}", status, body)
            }
            Error::UnexpectedStatus { status, body } => {
                write!(f, "Unexpected status {}: {}", status, body)
            }
            Error::Provider(msg) => write!(f, "Provider error: {}", msg),
            Error::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
            Error::Other(err) => write!(f, "Other error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Deserialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_transient() {
        assert!(Error::Network("connection reset".to_string()).is_transient());
        assert!(Error::Timeout("30s elapsed".to_string()).is_transient());
    }

    #[test]
    fn test_status_errors_transient_only_for_server_side_failures() {
        let status = |status| Error::UnexpectedStatus {
            status,
            body: String::new(),
        };

        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert!(!status(401).is_transient());
    }

    #[test]
    fn test_terminal_errors_are_not_transient() {
        assert!(!Error::Deserialization("bad json".to_string()).is_transient());
        assert!(!Error::Provider("audio too long".to_string()).is_transient());
        assert!(!Error::Submission {
            status: 400,
            body: "{}".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_submission_display_includes_status_and_body() {
        let err = Error::Submission {
            status: 401,
            body: r#"{"message":"unauthorized"}"#.to_string(),
        };

        let rendered = err.to_string();
        assert!(rendered.contains("401"));
        assert!(rendered.contains("unauthorized"));
    }

    #[test]
    fn test_serde_error_maps_to_deserialization() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();

        assert!(matches!(err, Error::Deserialization(_)));
    }
}
