//! Event handler: one storage notification in, N page images out.
//!
//! [`handle_event`] is a plain async function over injected collaborators,
//! so it is driven the same way by the Lambda bootstrap, the local CLI and
//! the tests. Every step is sequential. Pages are published in ascending
//! order and the first failure ends the run: pages already written stay
//! written, later pages are never attempted.

use crate::config::ConversionConfig;
use crate::error::Pdf2ImageError;
use crate::event::TriggerEvent;
use crate::pipeline::publish::{publish_page, OutputDescriptor};
use crate::pipeline::render::{Rasterizer, RenderOptions};
use crate::pipeline::fetch;
use crate::storage::ObjectStore;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Only keys with this exact, case-sensitive suffix are processed.
pub const SUPPORTED_SUFFIX: &str = ".pdf";

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOutcome {
    pub source_bucket: String,
    pub source_key: String,
    /// Pages rendered and published.
    pub page_count: usize,
    /// Destination keys, in page order.
    pub outputs: Vec<String>,
    pub duration_ms: u64,
}

impl fmt::Display for ConversionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PDF document ({}) successfully converted to a series of images.",
            self.source_key
        )
    }
}

/// Bucket the pages of `event` are written to.
///
/// The configured origin bucket wins; when it is empty the pages go back to
/// the bucket the document arrived in.
pub fn destination_bucket<'a>(config: &'a ConversionConfig, event: &'a TriggerEvent) -> &'a str {
    if config.origin_bucket.is_empty() {
        &event.bucket
    } else {
        &config.origin_bucket
    }
}

/// Process one trigger event end to end.
///
/// # Errors
/// - [`Pdf2ImageError::UnsupportedInputType`]: key does not end in `.pdf`;
///   nothing was read or written
/// - [`Pdf2ImageError::FetchError`]: the document could not be read
/// - [`Pdf2ImageError::DecodeError`]: the bytes are not a usable PDF
/// - [`Pdf2ImageError::EncodeFailed`] / [`Pdf2ImageError::PublishError`]:
///   a page could not be written; earlier pages remain in storage
#[instrument(skip_all, fields(bucket = %event.bucket, key = %event.key))]
pub async fn handle_event(
    event: &TriggerEvent,
    config: &ConversionConfig,
    store: &dyn ObjectStore,
    rasterizer: &dyn Rasterizer,
) -> Result<ConversionOutcome, Pdf2ImageError> {
    let start = Instant::now();

    // ── Step 1: Validate ─────────────────────────────────────────────────
    if !event.key.ends_with(SUPPORTED_SUFFIX) {
        return Err(Pdf2ImageError::UnsupportedInputType {
            key: event.key.clone(),
        });
    }

    let destination = destination_bucket(config, event);
    if !config.origin_bucket.is_empty() && config.origin_bucket != event.bucket {
        warn!(
            origin_bucket = %config.origin_bucket,
            "Event bucket differs from the configured origin bucket; pages go to the origin bucket"
        );
    }

    // ── Step 2: Fetch ────────────────────────────────────────────────────
    let document = fetch::fetch_document(store, event).await?;

    // ── Step 3: Rasterise ────────────────────────────────────────────────
    let render_start = Instant::now();
    let pages = rasterizer
        .rasterize(&event.key, document, RenderOptions::from(config))
        .await?;
    let page_count = pages.len();
    info!(
        "Successfully converted pdf to {} images in {}ms",
        page_count,
        render_start.elapsed().as_millis()
    );

    // ── Step 4: Publish each page in order ───────────────────────────────
    let mut outputs = Vec::with_capacity(page_count);
    for page in &pages {
        let descriptor =
            OutputDescriptor::for_page(event, destination, page.index, page_count, config.format);
        publish_page(store, &event.key, page, &descriptor, config.format).await?;
        outputs.push(descriptor.key);
    }

    // ── Step 5: Report ───────────────────────────────────────────────────
    let outcome = ConversionOutcome {
        source_bucket: event.bucket.clone(),
        source_key: event.key.clone(),
        page_count,
        outputs,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(pages = page_count, duration_ms = outcome.duration_ms, "{}", outcome);

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crate::pipeline::render::PageImage;
    use async_trait::async_trait;

    /// Must never be reached.
    struct UnreachableRasterizer;

    #[async_trait]
    impl Rasterizer for UnreachableRasterizer {
        async fn rasterize(
            &self,
            _key: &str,
            _document: Vec<u8>,
            _options: RenderOptions,
        ) -> Result<Vec<PageImage>, Pdf2ImageError> {
            panic!("rasterizer must not be called");
        }
    }

    #[test]
    fn destination_prefers_origin_bucket() {
        let event = TriggerEvent::new("arrivals", "a/b.pdf");
        let configured = ConversionConfig::builder()
            .origin_bucket("origin")
            .build()
            .unwrap();
        assert_eq!(destination_bucket(&configured, &event), "origin");

        let unconfigured = ConversionConfig::default();
        assert_eq!(destination_bucket(&unconfigured, &event), "arrivals");
    }

    #[test]
    fn outcome_message_names_source() {
        let outcome = ConversionOutcome {
            source_bucket: "b".into(),
            source_key: "in/x.pdf".into(),
            page_count: 3,
            outputs: vec![],
            duration_ms: 1,
        };
        assert_eq!(
            outcome.to_string(),
            "PDF document (in/x.pdf) successfully converted to a series of images."
        );
    }

    #[tokio::test]
    async fn suffix_check_is_case_sensitive() {
        let store = InMemoryStore::new();
        store.insert("b", "in/REPORT.PDF", b"%PDF-1.7".to_vec());
        let config = ConversionConfig::default();

        let err = handle_event(
            &TriggerEvent::new("b", "in/REPORT.PDF"),
            &config,
            &store,
            &UnreachableRasterizer,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Pdf2ImageError::UnsupportedInputType { .. }));
        assert!(store.ops().is_empty());
    }
}
