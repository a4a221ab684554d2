//! Object storage collaborators.
//!
//! The pipeline only ever needs two operations: read a whole object and
//! write a whole object with user metadata. [`ObjectStore`] captures exactly
//! that, so the handler can run against S3 in production, a directory tree
//! on a laptop, or an in-memory map in tests.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`s3::S3Store`] | Lambda deployment |
//! | [`fs::LocalFsStore`] | `pdf2image` CLI, buckets are directories |
//! | [`memory::InMemoryStore`] | tests; records every read and write |

pub mod fs;
pub mod memory;
pub mod s3;

use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub use fs::LocalFsStore;
pub use memory::InMemoryStore;
pub use s3::S3Store;

/// User metadata attached to a stored object.
pub type ObjectMetadata = BTreeMap<String, String>;

/// A bucket/key object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the full body of `bucket/key`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write `body` to `bucket/key`, replacing any existing object.
    ///
    /// Either the object becomes visible with its metadata or an error is
    /// returned.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError>;
}
