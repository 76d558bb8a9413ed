//! S3-compatible Object Storage gateway.
//!
//! The audio file is uploaded under a unique key so SpeechKit can fetch it by URI,
//! and removed again once recognition no longer needs it.

use crate::error::Error as DomainError;
use async_trait::async_trait;
use log::*;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use secrecy::ExposeSecret;
use service::config::{Config, Credentials};
use speech_ai::traits::storage::Storage;
use speech_ai::types::storage::UploadRecord;
use speech_ai::Error;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    endpoint: String,
    bucket: String,
}

impl ObjectStorage {
    /// Connect to the bucket named in `credentials` using static access keys.
    pub fn new(config: &Config, credentials: &Credentials) -> Result<Self, DomainError> {
        let store = AmazonS3Builder::new()
            .with_endpoint(config.storage_endpoint())
            .with_region(config.storage_region())
            .with_bucket_name(&credentials.bucket)
            .with_access_key_id(&credentials.access_key_id)
            .with_secret_access_key(credentials.secret_access_key.expose_secret())
            .build()
            .map_err(|e| {
                warn!("Failed to configure object storage client: {:?}", e);
                Error::Configuration(e.to_string())
            })?;

        Ok(Self::with_store(
            Arc::new(store),
            config.storage_endpoint(),
            &credentials.bucket,
        ))
    }

    /// Wrap an already configured store, e.g. an in-memory one.
    pub fn with_store(store: Arc<dyn ObjectStore>, endpoint: &str, bucket: &str) -> Self {
        Self {
            store,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        }
    }
}

/// `<uuid>-<file name>`, unique per upload.
///
/// Characters outside `[A-Za-z0-9._-]` are replaced with `_`, so the key is stored
/// verbatim and can be placed in a URI without escaping.
fn object_key(local_path: &Path) -> Result<String, Error> {
    let file_name = local_path
        .file_name()
        .ok_or_else(|| Error::Io(format!("{} has no file name", local_path.display())))?;

    let file_name: String = file_name
        .to_string_lossy()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    Ok(format!("{}-{}", Uuid::new_v4(), file_name))
}

#[async_trait]
impl Storage for ObjectStorage {
    async fn upload(&self, local_path: &Path) -> Result<UploadRecord, Error> {
        let body = tokio::fs::read(local_path).await.map_err(|e| {
            warn!("Failed to read {}: {:?}", local_path.display(), e);
            Error::Io(format!("Failed to read {}: {}", local_path.display(), e))
        })?;

        let location = ObjectPath::from(object_key(local_path)?);
        let size_bytes = body.len();

        debug!(
            "Uploading {} ({} bytes) to {}/{}",
            local_path.display(),
            size_bytes,
            self.bucket,
            location
        );

        self.store
            .put(&location, PutPayload::from(body))
            .await
            .map_err(|e| {
                warn!("Failed to upload to bucket {}: {:?}", self.bucket, e);
                Error::Upload(format!(
                    "unable to upload {} to {}: {}",
                    local_path.display(),
                    self.bucket,
                    e
                ))
            })?;

        info!("Uploaded {} to {}/{}", local_path.display(), self.bucket, location);

        Ok(UploadRecord {
            bucket: self.bucket.clone(),
            key: location.to_string(),
            size_bytes,
        })
    }

    async fn delete(&self, record: &UploadRecord) {
        let location = ObjectPath::from(record.key.as_str());
        match self.store.delete(&location).await {
            Ok(()) => info!("Deleted {}/{}", record.bucket, record.key),
            Err(e) => warn!(
                "Failed to delete {}/{}, leaving it in place: {:?}",
                record.bucket, record.key, e
            ),
        }
    }

    fn object_uri(&self, record: &UploadRecord) -> String {
        format!("{}/{}/{}", self.endpoint, record.bucket, record.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::RetryConfig;
    use std::io::Write;
    use std::time::Duration;

    const ENDPOINT: &str = "https://storage.yandexcloud.net";

    fn audio_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("voice")
            .suffix(".ogg")
            .tempfile()
            .unwrap();
        file.write_all(contents).unwrap();
        file
    }

    fn unreachable_store() -> Arc<dyn ObjectStore> {
        let store = AmazonS3Builder::new()
            .with_endpoint("http://127.0.0.1:1")
            .with_allow_http(true)
            .with_region("ru-central1")
            .with_bucket_name("audio-bucket")
            .with_access_key_id("key-id")
            .with_secret_access_key("secret")
            .with_retry(RetryConfig {
                max_retries: 0,
                retry_timeout: Duration::from_secs(1),
                ..Default::default()
            })
            .build()
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_object_key_prefixes_uuid_to_file_name() {
        let key = object_key(Path::new("/tmp/records/tmp.ogg")).unwrap();

        let (uuid, name) = key.split_at(36);
        assert!(Uuid::parse_str(uuid).is_ok());
        assert_eq!(name, "-tmp.ogg");
    }

    #[test]
    fn test_object_key_replaces_characters_unsafe_in_uris() {
        let key = object_key(Path::new("/tmp/my voice #1 100%.ogg")).unwrap();

        assert_eq!(&key[36..], "-my_voice__1_100_.ogg");
        assert_eq!(ObjectPath::from(key.as_str()).as_ref(), key);
    }

    #[tokio::test]
    async fn test_upload_then_delete_with_unusual_file_name() {
        let store = Arc::new(InMemory::new());
        let storage = ObjectStorage::with_store(store.clone(), ENDPOINT, "audio-bucket");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("call #2 (50%).ogg");
        std::fs::write(&path, b"OggS").unwrap();

        let record = storage.upload(&path).await.unwrap();
        let uri = storage.object_uri(&record);

        assert!(!uri.contains(' ') && !uri.contains('#') && !uri.contains('%'));
        assert!(uri.ends_with(&record.key));

        storage.delete(&record).await;

        assert!(matches!(
            store.head(&ObjectPath::from(record.key.as_str())).await,
            Err(object_store::Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_object_keys_are_unique() {
        let path = Path::new("voice.ogg");
        assert_ne!(object_key(path).unwrap(), object_key(path).unwrap());
    }

    #[test]
    fn test_path_without_file_name_is_io_error() {
        assert!(matches!(object_key(Path::new("/")), Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_upload_then_delete_leaves_key_absent() {
        let store = Arc::new(InMemory::new());
        let storage = ObjectStorage::with_store(store.clone(), ENDPOINT, "audio-bucket");
        let file = audio_file(b"OggS known bytes");

        let record = storage.upload(file.path()).await.unwrap();
        let location = ObjectPath::from(record.key.as_str());

        assert_eq!(record.bucket, "audio-bucket");
        assert_eq!(record.size_bytes, 16);
        let stored = store.get(&location).await.unwrap().bytes().await.unwrap();
        assert_eq!(stored.as_ref(), b"OggS known bytes");

        storage.delete(&record).await;

        assert!(matches!(
            store.head(&location).await,
            Err(object_store::Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_object_uri_is_endpoint_bucket_key() {
        let storage =
            ObjectStorage::with_store(Arc::new(InMemory::new()), "https://storage/", "bucket");
        let record = UploadRecord {
            bucket: "bucket".to_string(),
            key: "uuid-voice.ogg".to_string(),
            size_bytes: 1,
        };

        assert_eq!(
            storage.object_uri(&record),
            "https://storage/bucket/uuid-voice.ogg"
        );
    }

    #[tokio::test]
    async fn test_unreadable_file_is_io_error() {
        let storage =
            ObjectStorage::with_store(Arc::new(InMemory::new()), ENDPOINT, "audio-bucket");

        let err = storage
            .upload(Path::new("/definitely/not/here/voice.ogg"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_unreachable_storage_is_upload_error() {
        let storage = ObjectStorage::with_store(unreachable_store(), ENDPOINT, "audio-bucket");
        let file = audio_file(b"OggS");

        let err = storage.upload(file.path()).await.unwrap_err();

        assert!(matches!(err, Error::Upload(_)));
    }

    #[tokio::test]
    async fn test_delete_failure_is_swallowed() {
        let storage = ObjectStorage::with_store(unreachable_store(), ENDPOINT, "audio-bucket");
        let record = UploadRecord {
            bucket: "audio-bucket".to_string(),
            key: "uuid-voice.ogg".to_string(),
            size_bytes: 4,
        };

        // Returns unit; reaching the end of the test is the assertion.
        storage.delete(&record).await;
    }
}
