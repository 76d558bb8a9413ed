//! End-to-end transcription of a local audio file.
//!
//! A [`Transcriber`] uploads the audio, submits a recognition job for the uploaded
//! object and hands the resulting operation to a background polling task. The caller
//! gets a [`TranscriptionJob`] right away and reads the single result from it.

use crate::error::Error;
use crate::gateway::object_storage::ObjectStorage;
use crate::gateway::speechkit::SpeechKitClient;
use crate::poller::{OperationPoller, PollOutcome, PollerConfig};
use crate::result_channel::{self, Delivery, ResultReceiver};
use log::*;
use service::config::{CleanupPolicy, Config};
use speech_ai::traits::storage::Storage;
use speech_ai::traits::transcription::Provider;
use speech_ai::types::recognition::{OperationHandle, RecognitionRequest};
use speech_ai::types::storage::UploadRecord;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

pub struct Transcriber {
    storage: Arc<dyn Storage>,
    provider: Arc<dyn Provider>,
    poller_config: PollerConfig,
    language_code: String,
    model: Option<String>,
    profanity_filter: Option<bool>,
    cleanup: CleanupPolicy,
    cleanup_timeout: Duration,
}

impl Transcriber {
    pub fn new(storage: Arc<dyn Storage>, provider: Arc<dyn Provider>, config: &Config) -> Self {
        Self {
            storage,
            provider,
            poller_config: PollerConfig::from(config),
            language_code: config.language_code.clone(),
            model: config.recognition_model.clone(),
            profanity_filter: config.profanity_filter,
            cleanup: config.cleanup_policy,
            cleanup_timeout: config.cleanup_timeout(),
        }
    }

    /// Build the Object Storage and SpeechKit gateways from `config`.
    ///
    /// Fails with a config error before any network or file I/O when a credential
    /// or the bucket is missing.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let credentials = config.credentials()?;

        let storage = ObjectStorage::new(config, &credentials)?;
        let provider = SpeechKitClient::new(config, &credentials)?;

        Ok(Self::new(Arc::new(storage), Arc::new(provider), config))
    }

    pub async fn upload(&self, audio_file: &Path) -> Result<UploadRecord, Error> {
        Ok(self.storage.upload(audio_file).await?)
    }

    /// Submit a recognition job for an uploaded object.
    ///
    /// With [`CleanupPolicy::Always`] a rejected submission also removes the object.
    pub async fn submit(&self, record: &UploadRecord) -> Result<OperationHandle, Error> {
        let request = RecognitionRequest {
            audio_uri: self.storage.object_uri(record),
            language_code: self.language_code.clone(),
            model: self.model.clone(),
            profanity_filter: self.profanity_filter,
        };

        match self.provider.submit(request).await {
            Ok(handle) => Ok(handle),
            Err(e) => {
                if self.cleanup == CleanupPolicy::Always {
                    remove(self.storage.as_ref(), record, self.cleanup_timeout).await;
                }
                Err(e.into())
            }
        }
    }

    /// Start polling `operation` in the background.
    ///
    /// Once polling reaches a terminal state the result is delivered, and only then is
    /// the uploaded object removed according to the cleanup policy.
    pub fn observe(&self, record: UploadRecord, operation: OperationHandle) -> TranscriptionJob {
        let poller = OperationPoller::new(self.provider.clone(), self.poller_config.clone());
        let storage = self.storage.clone();
        let cleanup = self.cleanup;
        let cleanup_timeout = self.cleanup_timeout;
        let (sender, results) = result_channel::channel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let outcome = poller.run(&operation, &token).await;

            match &outcome {
                PollOutcome::Done(text) => sender.deliver(Delivery::Transcript(text.clone())),
                PollOutcome::TimedOut => sender.deliver(Delivery::TimedOut),
                PollOutcome::Aborted(_) | PollOutcome::Cancelled => drop(sender),
            }

            if should_delete(cleanup, &outcome) {
                remove(storage.as_ref(), &record, cleanup_timeout).await;
            } else {
                debug!("Keeping {}/{} after {:?}", record.bucket, record.key, outcome);
            }

            outcome
        });

        TranscriptionJob {
            results,
            handle,
            cancel,
        }
    }

    /// Upload `audio_file`, submit it and start polling.
    ///
    /// Returns as soon as the job is accepted; upload and submission errors are
    /// returned directly and no channel is created for them.
    pub async fn start(&self, audio_file: &Path) -> Result<TranscriptionJob, Error> {
        let record = self.upload(audio_file).await?;
        let operation = self.submit(&record).await?;
        info!(
            "Transcribing {} as operation {}",
            audio_file.display(),
            operation
        );
        Ok(self.observe(record, operation))
    }
}

/// Best-effort delete, abandoned after `limit`.
async fn remove(storage: &dyn Storage, record: &UploadRecord, limit: Duration) {
    if time::timeout(limit, storage.delete(record)).await.is_err() {
        warn!(
            "Deleting {}/{} took longer than {:?}, leaving it in place",
            record.bucket, record.key, limit
        );
    }
}

fn should_delete(cleanup: CleanupPolicy, outcome: &PollOutcome) -> bool {
    match cleanup {
        CleanupPolicy::Always => true,
        CleanupPolicy::OnSuccess => outcome.is_done(),
    }
}

/// A running transcription.
pub struct TranscriptionJob {
    results: ResultReceiver,
    handle: JoinHandle<PollOutcome>,
    cancel: CancellationToken,
}

/// What a finished job produced.
#[derive(Debug)]
pub struct JobReport {
    /// The value read from the result channel; `None` for aborted or cancelled jobs.
    pub delivery: Option<Delivery>,
    pub outcome: PollOutcome,
}

impl TranscriptionJob {
    /// Stop polling. The job still finishes through [`TranscriptionJob::finish`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the single result; `None` once the channel closed without one.
    ///
    /// Resolves as soon as polling ends, before the uploaded object is cleaned up.
    /// Cancel-safe, so it can race other futures in `select!`.
    pub async fn delivery(&mut self) -> Option<Delivery> {
        self.results.recv().await
    }

    /// Wait for the polling task, including cleanup, and return its terminal state.
    pub async fn finish(self) -> PollOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Polling task failed: {}", e);
                PollOutcome::Aborted(speech_ai::Error::Other(e.to_string().into()))
            }
        }
    }

    /// Wait for both the result and the terminal state.
    pub async fn wait(mut self) -> JobReport {
        let delivery = self.delivery().await;
        let outcome = self.finish().await;

        JobReport { delivery, outcome }
    }
}
