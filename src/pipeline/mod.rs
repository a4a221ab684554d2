//! Pipeline stages for PDF-to-image conversion.
//!
//! Each submodule implements exactly one step. The orchestrator in
//! [`crate::handler`] sequences them; none of them knows about the others.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ render ──▶ keys ──▶ encode ──▶ publish
//! (store)   (pdfium)   (pure)   (image)    (store)
//! ```
//!
//! 1. [`fetch`]    read the source document from the object store
//! 2. [`render`]   rasterise every page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`keys`]     derive each page's destination key from the source key
//! 4. [`encode`]   serialise a page to PNG / JPEG / TIFF / PPM bytes
//! 5. [`publish`]  attach source metadata and write the page to storage

pub mod encode;
pub mod fetch;
pub mod keys;
pub mod publish;
pub mod render;
