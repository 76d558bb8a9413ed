//! SpeechKit API client for long-running recognition.
//!
//! Jobs are submitted to the SpeechKit v2 `longRunningRecognize` endpoint and
//! observed through the Operation API. Both endpoints authenticate with a service
//! account API key.

use crate::error::Error as DomainError;
use crate::gateway::operation;
use async_trait::async_trait;
use log::*;
use reqwest::StatusCode;
use serde::Serialize;
use service::config::{Config, Credentials};
use speech_ai::traits::transcription::Provider;
use speech_ai::types::recognition::{OperationHandle, OperationStatus, RecognitionRequest};
use speech_ai::Error;
use speech_auth::api_key::ApiKeyAuth;
use speech_auth::http::{AuthenticatedClient, AuthenticatedClientBuilder};

const PROVIDER_ID: &str = "speechkit";

/// Request body of `longRunningRecognize`
#[derive(Debug, Serialize)]
struct LongRunningRecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: Audio<'a>,
}

#[derive(Debug, Serialize)]
struct RecognitionConfig<'a> {
    specification: Specification<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Specification<'a> {
    language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profanity_filter: Option<bool>,
}

#[derive(Debug, Serialize)]
struct Audio<'a> {
    uri: &'a str,
}

impl<'a> From<&'a RecognitionRequest> for LongRunningRecognizeRequest<'a> {
    fn from(request: &'a RecognitionRequest) -> Self {
        Self {
            config: RecognitionConfig {
                specification: Specification {
                    language_code: &request.language_code,
                    model: request.model.as_deref(),
                    profanity_filter: request.profanity_filter,
                },
            },
            audio: Audio {
                uri: &request.audio_uri,
            },
        }
    }
}

/// SpeechKit API client
pub struct SpeechKitClient {
    submit_client: AuthenticatedClient,
    status_client: AuthenticatedClient,
    transcription_base_url: String,
    operation_base_url: String,
}

impl SpeechKitClient {
    /// Create a client from the validated credentials and the endpoint settings in `config`.
    ///
    /// Submissions are never retried since a repeated POST would start a second job;
    /// status queries retry transient failures with exponential backoff.
    pub fn new(config: &Config, credentials: &Credentials) -> Result<Self, DomainError> {
        let submit_client = AuthenticatedClientBuilder::new()
            .with_auth(Box::new(ApiKeyAuth::speechkit(credentials.api_key.clone())))
            .with_timeout(config.request_timeout())
            .with_max_retries(0)
            .build()?;

        let status_client = AuthenticatedClientBuilder::new()
            .with_auth(Box::new(ApiKeyAuth::speechkit(credentials.api_key.clone())))
            .with_timeout(config.request_timeout())
            .with_max_retries(config.status_request_retries)
            .with_retry_delays(config.retry_base_delay(), config.retry_max_delay())
            .build()?;

        Ok(Self {
            submit_client,
            status_client,
            transcription_base_url: config.transcription_base_url().to_string(),
            operation_base_url: config.operation_base_url().to_string(),
        })
    }
}

#[async_trait]
impl Provider for SpeechKitClient {
    async fn submit(&self, request: RecognitionRequest) -> Result<OperationHandle, Error> {
        let url = format!(
            "{}/speech/stt/v2/longRunningRecognize",
            self.transcription_base_url
        );

        debug!(
            "Submitting SpeechKit recognition for audio: {} ({})",
            request.audio_uri, request.language_code
        );

        let body = serde_json::to_vec(&LongRunningRecognizeRequest::from(&request))
            .map_err(|e| Error::Other(Box::new(e)))?;

        let response = self
            .submit_client
            .post(&url)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to submit SpeechKit recognition: {:?}", e);
                transport_error(e)
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            warn!("Failed to read SpeechKit submission response: {:?}", e);
            Error::Network(e.to_string())
        })?;

        if status != StatusCode::OK {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            error!("SpeechKit rejected recognition ({}): {}", status, body);
            return Err(Error::Submission {
                status: status.as_u16(),
                body,
            });
        }

        let payload = operation::parse(&bytes).inspect_err(|e| {
            warn!("Failed to parse SpeechKit submission response: {}", e);
        })?;
        let handle = operation::operation_id(&payload)?;

        info!("Created SpeechKit operation with ID: {}", handle);
        Ok(handle)
    }

    async fn get_operation(&self, handle: &OperationHandle) -> Result<OperationStatus, Error> {
        let url = format!("{}/operations/{}", self.operation_base_url, handle);

        let response = self.status_client.get(&url).send().await.map_err(|e| {
            warn!("Failed to get operation {}: {:?}", handle, e);
            transport_error(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            warn!("Failed to read operation {} response: {:?}", handle, e);
            Error::Network(e.to_string())
        })?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            warn!("Operation API returned {} for {}: {}", status, handle, body);
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload = operation::parse(&bytes)?;
        let operation_status = operation::operation_status(&payload)?;
        trace!("Operation {} done: {}", handle, operation_status.is_done());

        Ok(operation_status)
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}

fn transport_error(err: reqwest_middleware::Error) -> Error {
    match &err {
        reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => Error::Timeout(err.to_string()),
        _ => Error::Network(err.to_string()),
    }
}
