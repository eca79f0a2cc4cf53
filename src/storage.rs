use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

// Signed URLs expire after one hour
pub const PRESIGN_EXPIRY_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage configuration error: {0}")]
    Config(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

// Request-scoped projection of a stored object; the authoritative copy
// lives in the backend
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size_bytes: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectMeta>,
    pub next_continuation_token: Option<String>,
    pub is_truncated: bool,
}

#[derive(Debug, Clone)]
pub struct DeleteError {
    pub key: String,
    pub code: String,
    pub message: String,
}

// Partial failure is a value, not an error: `deleted` and `errors` are
// reported separately so callers can tell full, partial and zero success apart
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    pub deleted: u64,
    pub errors: Vec<DeleteError>,
}

/// Blob storage operations the gallery needs. `S3Store` is the production
/// implementation; tests swap in `MemoryStore`.
///
/// Presigning performs no key sanitization here: it is a thin
/// capability-granting primitive, and the download/delete handlers validate
/// keys before calling in.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Signed URL authorizing a PUT of `key` with the given content type.
    /// The backend rejects uploads whose content type does not match.
    async fn presign_put(&self, key: &str, content_type: &str) -> Result<String, StorageError>;

    /// Signed URL authorizing a GET of `key`; content type unconstrained.
    async fn presign_get(&self, key: &str) -> Result<String, StorageError>;

    /// One page of objects under `prefix`, in the backend's native order.
    /// `next_continuation_token` and `is_truncated` are passed through
    /// unchanged for the caller to request the next page.
    async fn list(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
        limit: i32,
    ) -> Result<ObjectPage, StorageError>;

    /// Single batched delete of all `keys`. Keys the backend could not
    /// delete come back in `errors`; the rest are counted in `deleted`.
    async fn delete_many(&self, keys: &[String]) -> Result<DeleteOutcome, StorageError>;
}

/// S3-backed store. Signing is a local cryptographic operation in the AWS
/// SDK, so the per-item presign calls made by the listing path never leave
/// the process.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    pub async fn connect(region: String, bucket: String) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region))
            .load()
            .await;
        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket,
        }
    }

    fn presigning(&self) -> Result<PresigningConfig, StorageError> {
        PresigningConfig::expires_in(Duration::from_secs(PRESIGN_EXPIRY_SECS))
            .map_err(|e| StorageError::Config(e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn presign_put(&self, key: &str, content_type: &str) -> Result<String, StorageError> {
        debug!(bucket = %self.bucket, key = %key, "presigning put");
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(self.presigning()?)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(presigned.uri().to_string())
    }

    async fn presign_get(&self, key: &str) -> Result<String, StorageError> {
        debug!(bucket = %self.bucket, key = %key, "presigning get");
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(self.presigning()?)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(presigned.uri().to_string())
    }

    async fn list(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
        limit: i32,
    ) -> Result<ObjectPage, StorageError> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(limit);
        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let output = request
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let objects = output
            .contents()
            .iter()
            .map(|object| ObjectMeta {
                key: object.key().unwrap_or_default().to_string(),
                last_modified: object
                    .last_modified()
                    .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
                    .unwrap_or_else(Utc::now),
                size_bytes: object.size().unwrap_or(0),
            })
            .collect();

        Ok(ObjectPage {
            objects,
            next_continuation_token: output.next_continuation_token().map(str::to_string),
            is_truncated: output.is_truncated().unwrap_or(false),
        })
    }

    async fn delete_many(&self, keys: &[String]) -> Result<DeleteOutcome, StorageError> {
        let mut identifiers = Vec::with_capacity(keys.len());
        for key in keys {
            let identifier = ObjectIdentifier::builder()
                .key(key)
                .build()
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            identifiers.push(identifier);
        }

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(false)
            .build()
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        debug!(bucket = %self.bucket, count = keys.len(), "sending batched delete");
        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let errors = output
            .errors()
            .iter()
            .map(|error| DeleteError {
                key: error.key().unwrap_or_default().to_string(),
                code: error.code().unwrap_or("Unknown").to_string(),
                message: error.message().unwrap_or("unknown error").to_string(),
            })
            .collect();

        Ok(DeleteOutcome {
            deleted: output.deleted().len() as u64,
            errors,
        })
    }
}

// In-memory store for handler and contract tests. Lexicographic listing
// order matches what S3 returns; continuation tokens are "start after this
// key" markers.
#[cfg(test)]
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, ObjectMeta>>,
}

#[cfg(test)]
use std::{collections::BTreeMap, ops::Bound, sync::Mutex};

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            bucket: "test-bucket".to_string(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_keys(keys: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut objects = store.objects.lock().unwrap();
            for (index, key) in keys.iter().enumerate() {
                objects.insert(
                    (*key).to_string(),
                    ObjectMeta {
                        key: (*key).to_string(),
                        last_modified: Utc::now(),
                        size_bytes: 1024 * (index as i64 + 1),
                    },
                );
            }
        }
        store
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[cfg(test)]
#[async_trait]
impl ObjectStore for MemoryStore {
    async fn presign_put(&self, key: &str, content_type: &str) -> Result<String, StorageError> {
        Ok(format!(
            "memory://{}/{}?op=put&content-type={}",
            self.bucket, key, content_type
        ))
    }

    async fn presign_get(&self, key: &str) -> Result<String, StorageError> {
        Ok(format!("memory://{}/{}?op=get", self.bucket, key))
    }

    async fn list(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
        limit: i32,
    ) -> Result<ObjectPage, StorageError> {
        let objects = self.objects.lock().unwrap();
        let lower = match continuation_token {
            Some(token) => Bound::Excluded(token.to_string()),
            None => Bound::Unbounded,
        };

        let mut page: Vec<ObjectMeta> = Vec::new();
        let mut is_truncated = false;
        for (key, meta) in objects.range((lower, Bound::Unbounded)) {
            if !key.starts_with(prefix) {
                continue;
            }
            if page.len() as i32 == limit {
                is_truncated = true;
                break;
            }
            page.push(meta.clone());
        }

        let next_continuation_token = if is_truncated {
            page.last().map(|meta| meta.key.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            objects: page,
            next_continuation_token,
            is_truncated,
        })
    }

    async fn delete_many(&self, keys: &[String]) -> Result<DeleteOutcome, StorageError> {
        let mut objects = self.objects.lock().unwrap();
        let mut outcome = DeleteOutcome::default();
        for key in keys {
            if objects.remove(key).is_some() {
                outcome.deleted += 1;
            } else {
                outcome.errors.push(DeleteError {
                    key: key.clone(),
                    code: "NoSuchKey".to_string(),
                    message: "The specified key does not exist.".to_string(),
                });
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 5] = [
        "uploads/a.png",
        "uploads/b.png",
        "uploads/c.png",
        "uploads/d.png",
        "uploads/e.png",
    ];

    #[tokio::test]
    async fn list_pages_through_with_continuation_tokens() {
        let store = MemoryStore::with_keys(&KEYS);

        let first = store.list("uploads/", None, 2).await.unwrap();
        assert_eq!(first.objects.len(), 2);
        assert!(first.is_truncated);
        let token = first.next_continuation_token.clone().unwrap();
        assert_eq!(first.objects[0].key, "uploads/a.png");
        assert_eq!(first.objects[1].key, "uploads/b.png");

        let second = store.list("uploads/", Some(&token), 2).await.unwrap();
        assert_eq!(second.objects.len(), 2);
        assert!(second.is_truncated);

        let token = second.next_continuation_token.clone().unwrap();
        let third = store.list("uploads/", Some(&token), 2).await.unwrap();
        assert_eq!(third.objects.len(), 1);
        assert!(!third.is_truncated);
        assert!(third.next_continuation_token.is_none());
        assert_eq!(third.objects[0].key, "uploads/e.png");
    }

    #[tokio::test]
    async fn list_respects_prefix() {
        let store = MemoryStore::with_keys(&["other/x.png", "uploads/a.png"]);
        let page = store.list("uploads/", None, 10).await.unwrap();
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].key, "uploads/a.png");
    }

    #[tokio::test]
    async fn delete_many_reports_partial_failure() {
        let store = MemoryStore::with_keys(&["uploads/a.png"]);
        let keys = vec![
            "uploads/a.png".to_string(),
            "uploads/missing.png".to_string(),
        ];

        let outcome = store.delete_many(&keys).await.unwrap();
        assert_eq!(outcome.deleted, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].key, "uploads/missing.png");
        assert_eq!(outcome.errors[0].code, "NoSuchKey");
        assert!(!store.contains("uploads/a.png"));
    }

    #[tokio::test]
    async fn deleting_an_already_deleted_key_is_a_per_key_error() {
        let store = MemoryStore::with_keys(&["uploads/a.png"]);
        let keys = vec!["uploads/a.png".to_string()];

        let first = store.delete_many(&keys).await.unwrap();
        assert_eq!(first.deleted, 1);
        assert!(first.errors.is_empty());

        let second = store.delete_many(&keys).await.unwrap();
        assert_eq!(second.deleted, 0);
        assert_eq!(second.errors.len(), 1);
        assert_eq!(second.errors[0].code, "NoSuchKey");
    }

    #[tokio::test]
    async fn presigned_urls_are_scoped_to_operation_and_key() {
        let store = MemoryStore::new();
        let put = store
            .presign_put("uploads/a.png", "image/png")
            .await
            .unwrap();
        let get = store.presign_get("uploads/a.png").await.unwrap();
        assert!(put.contains("op=put"));
        assert!(put.contains("content-type=image/png"));
        assert!(get.contains("op=get"));
        assert_ne!(put, get);
    }
}
