//! Object fetch: read the triggering document from storage.

use crate::error::Pdf2ImageError;
use crate::event::TriggerEvent;
use crate::storage::ObjectStore;
use tracing::info;

/// Retrieve the raw bytes of the object named by `event`.
pub async fn fetch_document(
    store: &dyn ObjectStore,
    event: &TriggerEvent,
) -> Result<Vec<u8>, Pdf2ImageError> {
    info!(
        "Fetching item (bucket: '{}', key: '{}') from storage",
        event.bucket, event.key
    );

    let bytes = store
        .get_object(&event.bucket, &event.key)
        .await
        .map_err(|source| Pdf2ImageError::FetchError {
            bucket: event.bucket.clone(),
            key: event.key.clone(),
            source,
        })?;

    info!(size_bytes = bytes.len(), "Successfully retrieved storage object");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::InMemoryStore;

    #[tokio::test]
    async fn returns_stored_bytes() {
        let store = InMemoryStore::new();
        store.insert("docs", "a/b.pdf", b"%PDF-1.4 body".to_vec());

        let bytes = fetch_document(&store, &TriggerEvent::new("docs", "a/b.pdf"))
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.4 body");
    }

    #[tokio::test]
    async fn missing_object_becomes_fetch_error() {
        let store = InMemoryStore::new();
        let err = fetch_document(&store, &TriggerEvent::new("docs", "gone.pdf"))
            .await
            .unwrap_err();

        match err {
            Pdf2ImageError::FetchError { key, source, .. } => {
                assert_eq!(key, "gone.pdf");
                assert!(matches!(source, StorageError::NotFound { .. }));
            }
            other => panic!("expected FetchError, got {other:?}"),
        }
    }
}
