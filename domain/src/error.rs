//! Error types for the `domain` layer.
use service::config::ConfigError;
use speech_ai::Error as SpeechError;
use speech_auth::error::{Error as SpeechAuthError, ErrorKind as SpeechAuthErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error. Errors from
/// `speech-ai`, `speech-auth` and `service` are translated here so the binary only
/// ever sees domain errors.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Failures that happen before or without talking to a remote service.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
    Io,
    Other(String),
}

/// Failures reported by, or while reaching, object storage and the recognition service.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Storage,
    Submission { status: u16 },
    InvalidResponse,
    Timeout,
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{:?}: {}", self.error_kind, source),
            None => write!(f, "Domain Error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }
}

// This is where errors from the provider abstraction are translated to the `domain` layer.
impl From<SpeechError> for Error {
    fn from(err: SpeechError) -> Self {
        let error_kind = match &err {
            SpeechError::Configuration(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            SpeechError::Io(_) => DomainErrorKind::Internal(InternalErrorKind::Io),
            SpeechError::Upload(_) => DomainErrorKind::External(ExternalErrorKind::Storage),
            SpeechError::Submission { status, .. } => {
                DomainErrorKind::External(ExternalErrorKind::Submission { status: *status })
            }
            SpeechError::Network(_) | SpeechError::UnexpectedStatus { .. } => {
                DomainErrorKind::External(ExternalErrorKind::Network)
            }
            SpeechError::Timeout(_) => DomainErrorKind::External(ExternalErrorKind::Timeout),
            SpeechError::Deserialization(_) => {
                DomainErrorKind::External(ExternalErrorKind::InvalidResponse)
            }
            SpeechError::Provider(msg) => {
                DomainErrorKind::External(ExternalErrorKind::Other(msg.clone()))
            }
            SpeechError::Other(other) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(other.to_string()))
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<SpeechAuthError> for Error {
    fn from(err: SpeechAuthError) -> Self {
        let error_kind = match &err.error_kind {
            SpeechAuthErrorKind::ApiKey(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            SpeechAuthErrorKind::Http(_) => DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to build HTTP client".to_string(),
            )),
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_is_internal_config() {
        let err: Error = ConfigError::Missing("APIKEY").into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
        assert!(err.to_string().contains("APIKEY"));
    }

    #[test]
    fn test_submission_error_keeps_status() {
        let err: Error = SpeechError::Submission {
            status: 403,
            body: "forbidden".to_string(),
        }
        .into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Submission { status: 403 })
        );
        assert!(err.to_string().contains("forbidden"));
    }

    #[test]
    fn test_io_and_upload_errors_are_distinguished() {
        let io: Error = SpeechError::Io("no such file".to_string()).into();
        let upload: Error = SpeechError::Upload("access denied".to_string()).into();

        assert_eq!(
            io.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Io)
        );
        assert_eq!(
            upload.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Storage)
        );
    }
}
