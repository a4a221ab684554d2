//! In-memory [`ObjectStore`] that records every operation.

use super::{ObjectMetadata, ObjectStore};
use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// An object held by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: ObjectMetadata,
}

/// One recorded storage call, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get { bucket: String, key: String },
    Put { bucket: String, key: String },
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<(String, String), StoredObject>,
    ops: Vec<StoreOp>,
}

/// A thread-safe map of `(bucket, key)` to objects.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording an operation.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        let mut inner = self.lock();
        inner.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.into(),
                content_type: "application/octet-stream".to_string(),
                metadata: ObjectMetadata::new(),
            },
        );
    }

    /// Look up an object without recording an operation.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Every call made so far.
    pub fn ops(&self) -> Vec<StoreOp> {
        self.lock().ops.clone()
    }

    /// Number of `get_object` calls made so far.
    pub fn reads(&self) -> usize {
        self.lock()
            .ops
            .iter()
            .filter(|op| matches!(op, StoreOp::Get { .. }))
            .count()
    }

    /// Keys written by `put_object`, in write order.
    pub fn written_keys(&self) -> Vec<String> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                StoreOp::Put { key, .. } => Some(key.clone()),
                StoreOp::Get { .. } => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call; the map is
        // still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let mut inner = self.lock();
        inner.ops.push(StoreOp::Get {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        inner
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.body.clone())
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.ops.push(StoreOp::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        inner.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }
}
