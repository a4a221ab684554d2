//! Filesystem-backed [`ObjectStore`] for running the pipeline locally.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<bucket>/<key>                  object body
//! <root>/<bucket>/<key>.metadata.json    content type + user metadata
//! ```

use super::{ObjectMetadata, ObjectStore};
use crate::error::StorageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const SIDECAR_SUFFIX: &str = ".metadata.json";

/// Sidecar document written next to every object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSidecar {
    pub content_type: String,
    pub metadata: ObjectMetadata,
}

/// Buckets are directories below `root`, keys are relative paths.
///
/// Concurrent writers of one key resolve to last-write-wins. Clones share
/// the write lock, so a body and its sidecar always come from the same
/// `put_object` call.
#[derive(Debug, Clone)]
pub struct LocalFsStore {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl LocalFsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the object body. Keys that would escape the bucket
    /// directory are refused.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let escapes = |s: &str| {
            Path::new(s)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        };
        if bucket.is_empty() || escapes(bucket) || escapes(key.trim_start_matches('/')) {
            return Err(StorageError::Backend {
                bucket: bucket.to_string(),
                key: key.to_string(),
                detail: "bucket or key escapes the storage root".into(),
            });
        }
        Ok(self.root.join(bucket).join(key.trim_start_matches('/')))
    }

    /// Read back the sidecar written by [`ObjectStore::put_object`].
    pub async fn read_sidecar(&self, bucket: &str, key: &str) -> Result<ObjectSidecar, StorageError> {
        let path = sidecar_path(&self.object_path(bucket, key)?);
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|e| io_error(bucket, key, e))?;
        serde_json::from_slice(&raw).map_err(|e| StorageError::Backend {
            bucket: bucket.to_string(),
            key: key.to_string(),
            detail: format!("corrupt metadata sidecar: {e}"),
        })
    }
}

fn sidecar_path(object: &Path) -> PathBuf {
    let mut name = object.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

fn io_error(bucket: &str, key: &str, e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        ErrorKind::PermissionDenied => StorageError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => StorageError::Backend {
            bucket: bucket.to_string(),
            key: key.to_string(),
            detail: e.to_string(),
        },
    }
}

/// Write to a uniquely named temp file in the target's directory, then
/// rename it over the target.
async fn write_atomic(path: &Path, bytes: Vec<u8>) -> std::io::Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)?
}

#[async_trait]
impl ObjectStore for LocalFsStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(bucket, key)?;
        debug!(path = %path.display(), "Reading local object");
        tokio::fs::read(&path)
            .await
            .map_err(|e| io_error(bucket, key, e))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(bucket, key, e))?;
        }

        let sidecar = ObjectSidecar {
            content_type: content_type.to_string(),
            metadata: metadata.clone(),
        };
        let sidecar_json = serde_json::to_vec_pretty(&sidecar).map_err(|e| StorageError::Backend {
            bucket: bucket.to_string(),
            key: key.to_string(),
            detail: e.to_string(),
        })?;

        let size_bytes = body.len();

        // Sidecar first: a visible body always has its metadata.
        let _guard = self.write_lock.lock().await;
        write_atomic(&sidecar_path(&path), sidecar_json)
            .await
            .map_err(|e| io_error(bucket, key, e))?;
        write_atomic(&path, body)
            .await
            .map_err(|e| io_error(bucket, key, e))?;

        debug!(path = %path.display(), bytes = size_bytes, "Wrote local object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_writes_body_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path());
        let mut meta = ObjectMetadata::new();
        meta.insert("PAGE_COUNT".into(), "3".into());

        store
            .put_object("docs", "output/sub/1.png", vec![9, 9], "image/png", &meta)
            .await
            .unwrap();

        let body = std::fs::read(dir.path().join("docs/output/sub/1.png")).unwrap();
        assert_eq!(body, vec![9, 9]);

        let sidecar = store.read_sidecar("docs", "output/sub/1.png").await.unwrap();
        assert_eq!(sidecar.content_type, "image/png");
        assert_eq!(sidecar.metadata, meta);
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path());
        let err = store.get_object("docs", "nope.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_to_one_key_keep_last_writer() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path());
        let key = "output/sub/0.png";

        let tasks: Vec<_> = (0u8..8)
            .map(|writer| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut meta = ObjectMetadata::new();
                    meta.insert("ORIGINAL_DOCUMENT_KEY".into(), format!("in/sub/{writer}.pdf"));
                    for _ in 0..20 {
                        store
                            .put_object("docs", key, vec![writer; 16], "image/png", &meta)
                            .await?;
                    }
                    Ok::<_, StorageError>(())
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let body = store.get_object("docs", key).await.unwrap();
        let sidecar = store.read_sidecar("docs", key).await.unwrap();
        assert_eq!(body.len(), 16);
        assert_eq!(
            sidecar.metadata["ORIGINAL_DOCUMENT_KEY"],
            format!("in/sub/{}.pdf", body[0])
        );

        let mut names: Vec<_> = std::fs::read_dir(dir.path().join("docs/output/sub"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["0.png", "0.png.metadata.json"]);
    }

    #[test]
    fn traversal_is_refused() {
        let store = LocalFsStore::new("/tmp/root");
        assert!(store.object_path("docs", "../../etc/passwd").is_err());
        assert!(store.object_path("..", "a.pdf").is_err());
        assert!(store.object_path("", "a.pdf").is_err());
        assert_eq!(
            store.object_path("docs", "a/b.pdf").unwrap(),
            PathBuf::from("/tmp/root/docs/a/b.pdf")
        );
    }
}
