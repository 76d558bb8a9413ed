//! Transcription provider trait.

use crate::types::recognition::{OperationHandle, OperationStatus, RecognitionRequest};
use crate::Error;
use async_trait::async_trait;

/// Abstraction for long-running speech-to-text services.
///
/// A job is submitted once and then observed through its operation handle until
/// the provider reports it done.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Start an asynchronous recognition job for the audio at `request.audio_uri`.
    ///
    /// Returns as soon as the provider has accepted the job.
    async fn submit(&self, request: RecognitionRequest) -> Result<OperationHandle, Error>;

    /// Query the current state of a submitted operation.
    ///
    /// Transport failures surface as transient errors; a malformed payload or an
    /// operation reported as failed surface as terminal errors.
    async fn get_operation(&self, handle: &OperationHandle) -> Result<OperationStatus, Error>;

    /// Return unique identifier for this provider (e.g., "speechkit").
    fn provider_id(&self) -> &str;
}
