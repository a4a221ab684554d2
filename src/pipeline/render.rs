//! PDF rasterisation: turn document bytes into one `DynamicImage` per page.
//!
//! pdfium is a synchronous C++ library with thread-local state, so
//! [`PdfiumRasterizer`] binds and renders inside `spawn_blocking` and the
//! async runtime only awaits the finished page list.
//!
//! The orchestrator only sees the [`Rasterizer`] trait, so tests substitute
//! a fake that produces synthetic pages without pdfium.

use crate::config::{ConversionConfig, OutputFormat};
use crate::error::Pdf2ImageError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// PDF files start with `%PDF`; readers tolerate up to 1 KiB of junk before it.
const PDF_MAGIC: &[u8] = b"%PDF";
const MAGIC_SEARCH_WINDOW: usize = 1024;

/// pdfium page units are PostScript points.
const POINTS_PER_INCH: f32 = 72.0;

/// One decoded page, owned by the run that rendered it.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Zero-based page index in document order.
    pub index: usize,
    pub image: DynamicImage,
}

/// Rendering parameters passed to a [`Rasterizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Resolution in dots per inch.
    pub dpi: u32,
    /// Target encoding; formats without alpha get RGB pages.
    pub format: OutputFormat,
}

impl From<&ConversionConfig> for RenderOptions {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            dpi: config.dpi,
            format: config.format,
        }
    }
}

/// Converts a PDF document into its pages, in document order.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// `key` names the document in errors and logs only.
    ///
    /// Invalid or unparseable input fails with
    /// [`Pdf2ImageError::DecodeError`].
    async fn rasterize(
        &self,
        key: &str,
        document: Vec<u8>,
        options: RenderOptions,
    ) -> Result<Vec<PageImage>, Pdf2ImageError>;
}

/// [`Rasterizer`] backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    lib_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// `lib_dir` is the directory containing libpdfium; `None` uses the
    /// system library search path.
    pub fn new(lib_dir: Option<PathBuf>) -> Self {
        Self { lib_dir }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.pdfium_lib_path.clone())
    }

    /// Bind once to fail fast at startup instead of on the first event.
    pub fn check_binding(&self) -> Result<(), Pdf2ImageError> {
        bind_pdfium(self.lib_dir.as_deref()).map(|_| ())
    }
}

#[async_trait]
impl Rasterizer for PdfiumRasterizer {
    async fn rasterize(
        &self,
        key: &str,
        document: Vec<u8>,
        options: RenderOptions,
    ) -> Result<Vec<PageImage>, Pdf2ImageError> {
        ensure_pdf_magic(key, &document)?;

        let key = key.to_string();
        let lib_dir = self.lib_dir.clone();

        tokio::task::spawn_blocking(move || {
            render_pages_blocking(&key, lib_dir.as_deref(), document, options)
        })
        .await
        .map_err(|e| Pdf2ImageError::Internal(format!("Render task panicked: {}", e)))?
    }
}

/// Reject bytes that cannot be a PDF before handing them to pdfium.
pub fn ensure_pdf_magic(key: &str, document: &[u8]) -> Result<(), Pdf2ImageError> {
    let window = &document[..document.len().min(MAGIC_SEARCH_WINDOW)];
    if window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        return Ok(());
    }

    let mut magic = [0u8; 4];
    let n = document.len().min(4);
    magic[..n].copy_from_slice(&document[..n]);
    Err(Pdf2ImageError::DecodeError {
        key: key.to_string(),
        detail: format!("not a PDF document (first bytes: {magic:?})"),
    })
}

fn bind_pdfium(lib_dir: Option<&std::path::Path>) -> Result<Pdfium, Pdf2ImageError> {
    let bindings = match lib_dir {
        Some(dir) => {
            let dir = dir.to_string_lossy();
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&*dir))
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Pdf2ImageError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    key: &str,
    lib_dir: Option<&std::path::Path>,
    document: Vec<u8>,
    options: RenderOptions,
) -> Result<Vec<PageImage>, Pdf2ImageError> {
    let pdfium = bind_pdfium(lib_dir)?;

    let document = pdfium
        .load_pdf_from_byte_vec(document, None)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            let detail = if err_str.contains("Password") || err_str.contains("password") {
                "document is encrypted and requires a password".to_string()
            } else {
                err_str
            };
            Pdf2ImageError::DecodeError {
                key: key.to_string(),
                detail,
            }
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!(pages = total_pages, dpi = options.dpi, "PDF loaded");

    let render_config =
        PdfRenderConfig::new().scale_page_by_factor(options.dpi as f32 / POINTS_PER_INCH);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let page = pages
            .get(idx as u16)
            .map_err(|e| Pdf2ImageError::DecodeError {
                key: key.to_string(),
                detail: format!("page {}: {:?}", idx, e),
            })?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| Pdf2ImageError::DecodeError {
                key: key.to_string(),
                detail: format!("rendering page {} failed: {:?}", idx, e),
            })?;

        let mut image = bitmap.as_image();
        if !options.format.supports_alpha() {
            image = DynamicImage::ImageRgb8(image.into_rgb8());
        }

        debug!(
            "Rendered page {} → {}x{} px",
            idx,
            image.width(),
            image.height()
        );

        results.push(PageImage { index: idx, image });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_at_start_is_accepted() {
        assert!(ensure_pdf_magic("a.pdf", b"%PDF-1.7\n...").is_ok());
    }

    #[test]
    fn magic_after_leading_junk_is_accepted() {
        let mut doc = vec![b' '; 100];
        doc.extend_from_slice(b"%PDF-1.4");
        assert!(ensure_pdf_magic("a.pdf", &doc).is_ok());
    }

    #[test]
    fn non_pdf_is_decode_error() {
        let err = ensure_pdf_magic("a.pdf", b"\x89PNG\r\n\x1a\n").unwrap_err();
        match err {
            Pdf2ImageError::DecodeError { key, detail } => {
                assert_eq!(key, "a.pdf");
                assert!(detail.contains("not a PDF"), "got: {detail}");
            }
            other => panic!("expected DecodeError, got {other:?}"),
        }
    }

    #[test]
    fn empty_document_is_decode_error() {
        assert!(matches!(
            ensure_pdf_magic("empty.pdf", b""),
            Err(Pdf2ImageError::DecodeError { .. })
        ));
    }

    #[test]
    fn render_options_follow_config() {
        let config = ConversionConfig::builder()
            .dpi(200)
            .format(OutputFormat::Jpeg)
            .build()
            .unwrap();
        let options = RenderOptions::from(&config);
        assert_eq!(options.dpi, 200);
        assert_eq!(options.format, OutputFormat::Jpeg);
    }

    #[tokio::test]
    async fn garbage_is_rejected_before_binding_pdfium() {
        // Points at a directory with no pdfium: reaching the binder would
        // produce PdfiumBindingFailed instead of DecodeError.
        let rasterizer = PdfiumRasterizer::new(Some(PathBuf::from("/nonexistent")));
        let options = RenderOptions {
            dpi: 72,
            format: OutputFormat::Png,
        };
        let err = rasterizer
            .rasterize("junk.pdf", b"hello".to_vec(), options)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ImageError::DecodeError { .. }));
    }
}
