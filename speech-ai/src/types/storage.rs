//! Types for uploaded audio objects.

/// Object created in storage for the duration of one recognition run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub bucket: String,
    /// `<uuid>-<file name>`.
    pub key: String,
    pub size_bytes: usize,
}
