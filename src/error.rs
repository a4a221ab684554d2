//! Error types for the pdf2image library.
//!
//! Two layers of error exist:
//!
//! * [`StorageError`]: returned by an [`crate::storage::ObjectStore`]
//!   implementation. It knows nothing about pages or documents, only that a
//!   `(bucket, key)` read or write went wrong.
//!
//! * [`Pdf2ImageError`]: **Fatal** for one invocation. Returned by
//!   [`crate::handler::handle_event`] and wraps storage failures with the
//!   document key (and page) they happened on, so a failed run can be traced
//!   back to the document that caused it.
//!
//! Configuration parsing never produces an error: bad values are logged and
//! replaced by defaults in [`crate::config::ConversionConfig::from_lookup`].

use thiserror::Error;

/// Failure reported by a storage backend for a single object operation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object (or its bucket) does not exist.
    #[error("object s3://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    /// Credentials do not allow the operation.
    #[error("access denied to s3://{bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    /// Anything else: network, throttling, quota, local I/O.
    #[error("storage backend error on s3://{bucket}/{key}: {detail}")]
    Backend {
        bucket: String,
        key: String,
        detail: String,
    },
}

/// All fatal errors returned by the pdf2image pipeline.
#[derive(Debug, Error)]
pub enum Pdf2ImageError {
    // ── Trigger errors ────────────────────────────────────────────────────
    /// The object key does not name a PDF document. Raised before any I/O.
    #[error("Only .pdf files are supported, got '{key}'")]
    UnsupportedInputType { key: String },

    /// The storage notification is missing a bucket or key, or the key is
    /// not valid percent-encoded UTF-8.
    #[error("Invalid storage notification: {0}")]
    InvalidEvent(String),

    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The source document could not be read from storage.
    #[error("Failed to fetch '{key}' from bucket '{bucket}': {source}")]
    FetchError {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// The bytes are not a parseable PDF, or pdfium failed on a page.
    #[error("Failed to decode PDF '{key}': {detail}")]
    DecodeError { key: String, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium (e.g. /opt/lib for a Lambda layer)."
    )]
    PdfiumBindingFailed(String),

    // ── Publish errors ────────────────────────────────────────────────────
    /// A rendered page could not be encoded in the configured format.
    #[error("Failed to encode page {page} of '{key}' as {format}: {detail}")]
    EncodeFailed {
        key: String,
        page: usize,
        format: String,
        detail: String,
    },

    /// Writing a page image back to storage failed.
    #[error("Failed to publish page {page} of '{key}' to '{destination}': {source}")]
    PublishError {
        key: String,
        page: usize,
        destination: String,
        #[source]
        source: StorageError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a format name is not supported.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2ImageError {
    /// The object key of the document this error is about, when known.
    pub fn document_key(&self) -> Option<&str> {
        match self {
            Pdf2ImageError::UnsupportedInputType { key }
            | Pdf2ImageError::FetchError { key, .. }
            | Pdf2ImageError::DecodeError { key, .. }
            | Pdf2ImageError::EncodeFailed { key, .. }
            | Pdf2ImageError::PublishError { key, .. } => Some(key),
            _ => None,
        }
    }
}
