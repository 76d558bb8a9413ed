//! Object storage trait.

use std::path::Path;

use crate::types::storage::UploadRecord;
use crate::Error;
use async_trait::async_trait;

/// Storage the recognition provider reads the audio from.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read `local_path` fully and store it under a freshly generated unique key.
    async fn upload(&self, local_path: &Path) -> Result<UploadRecord, Error>;

    /// Remove an uploaded object.
    ///
    /// Best-effort: failures are logged by the implementation and never returned,
    /// because the transcript may already have been delivered.
    async fn delete(&self, record: &UploadRecord);

    /// URI the recognition provider uses to fetch the object.
    fn object_uri(&self, record: &UploadRecord) -> String;
}
