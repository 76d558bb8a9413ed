//! Transcription workflow: upload the audio, submit a long-running recognition job,
//! poll the operation and hand back exactly one result.
//!
//! The `gateway` module talks to Object Storage and SpeechKit; everything else is
//! provider-agnostic and works against the `speech-ai` traits.

pub use speech_ai::types::recognition::{OperationHandle, Transcript};
pub use speech_ai::types::storage::UploadRecord;

pub mod error;
pub mod gateway;
pub mod poller;
pub mod result_channel;
pub mod transcription;

pub use poller::{OperationPoller, PollOutcome, PollerConfig};
pub use result_channel::{Delivery, TIMEOUT_NOTICE};
pub use transcription::{JobReport, Transcriber, TranscriptionJob};
