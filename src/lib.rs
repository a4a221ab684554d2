//! # pdf2image
//!
//! Rasterise every page of a PDF uploaded to a storage bucket and write the
//! page images back next to it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! S3 ObjectCreated (bucket, key)
//!  │
//!  ├─ 1. Validate  key must end in ".pdf"
//!  ├─ 2. Fetch     read the document from the object store
//!  ├─ 3. Render    rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 4. Name      output/<middle dirs>/<page>.<ext>
//!  ├─ 5. Publish   encode PNG / JPEG / TIFF / PPM, upload with metadata
//!  └─ 6. Report    "PDF document (<key>) successfully converted…"
//! ```
//!
//! Every page object carries `ORIGINAL_DOCUMENT_BUCKET`,
//! `ORIGINAL_DOCUMENT_KEY`, `PAGE_NUMBER` (zero-based) and `PAGE_COUNT`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2image::{handle_event, ConversionConfig, PdfiumRasterizer, S3Store, TriggerEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // DPI, FMT, ORIGIN_BUCKET, PDFIUM_LIB_PATH
//!     let config = ConversionConfig::from_env();
//!     let store = S3Store::from_env().await;
//!     let rasterizer = PdfiumRasterizer::from_config(&config);
//!
//!     let event = TriggerEvent::new("scans", "inbox/2024/contract.pdf");
//!     let outcome = handle_event(&event, &config, &store, &rasterizer).await?;
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `lambda` | on      | Enables the `pdf2image-lambda` bootstrap binary (lambda_runtime) |
//! | `cli`    | on      | Enables the `pdf2image` local binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod pipeline;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, OutputFormat};
pub use error::{Pdf2ImageError, StorageError};
pub use event::{trigger_from_s3_event, TriggerEvent};
pub use handler::{handle_event, ConversionOutcome};
pub use pipeline::publish::OutputDescriptor;
pub use pipeline::render::{PageImage, PdfiumRasterizer, Rasterizer, RenderOptions};
pub use storage::{InMemoryStore, LocalFsStore, ObjectMetadata, ObjectStore, S3Store};
