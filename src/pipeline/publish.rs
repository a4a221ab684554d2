//! Artifact publishing: encode one page and write it back with metadata
//! linking it to its source document.

use crate::config::OutputFormat;
use crate::error::Pdf2ImageError;
use crate::event::TriggerEvent;
use crate::pipeline::encode;
use crate::pipeline::keys::derive_output_key;
use crate::pipeline::render::PageImage;
use crate::storage::{ObjectMetadata, ObjectStore};
use tracing::info;

/// Metadata key: bucket of the source document.
pub const META_ORIGINAL_BUCKET: &str = "ORIGINAL_DOCUMENT_BUCKET";
/// Metadata key: object key of the source document.
pub const META_ORIGINAL_KEY: &str = "ORIGINAL_DOCUMENT_KEY";
/// Metadata key: zero-based page index.
pub const META_PAGE_NUMBER: &str = "PAGE_NUMBER";
/// Metadata key: number of pages in the source document.
pub const META_PAGE_COUNT: &str = "PAGE_COUNT";

/// Where one page goes and what is attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    pub bucket: String,
    pub key: String,
    pub metadata: ObjectMetadata,
}

impl OutputDescriptor {
    /// Describe page `page_index` of `page_count` for the document in `source`.
    pub fn for_page(
        source: &TriggerEvent,
        destination_bucket: &str,
        page_index: usize,
        page_count: usize,
        format: OutputFormat,
    ) -> Self {
        Self {
            bucket: destination_bucket.to_string(),
            key: derive_output_key(&source.key, page_index, format),
            metadata: page_metadata(source, page_index, page_count),
        }
    }

    /// `bucket/key`, for logs and error messages.
    pub fn location(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }
}

/// Metadata attached to every published page. All values are strings.
pub fn page_metadata(source: &TriggerEvent, page_index: usize, page_count: usize) -> ObjectMetadata {
    ObjectMetadata::from([
        (META_ORIGINAL_BUCKET.to_string(), source.bucket.clone()),
        (META_ORIGINAL_KEY.to_string(), source.key.clone()),
        (META_PAGE_NUMBER.to_string(), page_index.to_string()),
        (META_PAGE_COUNT.to_string(), page_count.to_string()),
    ])
}

/// Encode `page` and write it to `descriptor`. No retries.
pub async fn publish_page(
    store: &dyn ObjectStore,
    source_key: &str,
    page: &PageImage,
    descriptor: &OutputDescriptor,
    format: OutputFormat,
) -> Result<(), Pdf2ImageError> {
    let body = encode::encode_page(&page.image, format).map_err(|e| Pdf2ImageError::EncodeFailed {
        key: source_key.to_string(),
        page: page.index,
        format: format.to_string(),
        detail: e.to_string(),
    })?;

    info!(
        "Saving page number {} to storage at location: {}, {}",
        page.index, descriptor.bucket, descriptor.key
    );

    store
        .put_object(
            &descriptor.bucket,
            &descriptor.key,
            body,
            format.content_type(),
            &descriptor.metadata,
        )
        .await
        .map_err(|source| Pdf2ImageError::PublishError {
            key: source_key.to_string(),
            page: page.index,
            destination: descriptor.location(),
            source,
        })
}
