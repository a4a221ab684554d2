//! End-to-end tests against a real pdfium library.
//!
//! Documents are generated in-process (one blank page per entry in the
//! width list, so page order is visible in the rendered widths) and the
//! pages are written to a temporary directory through `LocalFsStore`. The
//! tests are gated behind the `E2E_ENABLED` environment variable so they do
//! not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=. cargo test --test e2e -- --nocapture

use image::ColorType;
use pdf2image::pipeline::publish::{META_PAGE_COUNT, META_PAGE_NUMBER};
use pdf2image::{
    handle_event, ConversionConfig, LocalFsStore, ObjectMetadata, ObjectStore, OutputFormat,
    Pdf2ImageError, PdfiumRasterizer, Rasterizer, RenderOptions, TriggerEvent,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Page widths in points; every page is 100pt tall.
const PAGE_WIDTHS: [u32; 3] = [144, 216, 288];

/// Minimal valid PDF with one empty page per width, in order.
fn multi_page_pdf(widths: &[u32]) -> Vec<u8> {
    let kids: Vec<String> = (0..widths.len()).map(|i| format!("{} 0 R", i + 3)).collect();
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            widths.len()
        ),
    ];
    for w in widths {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {w} 100] /Resources << >> >>"
        ));
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}

fn e2e_config(format: OutputFormat, dpi: u32) -> ConversionConfig {
    let mut builder = ConversionConfig::builder()
        .dpi(dpi)
        .format(format)
        .origin_bucket("docs");
    if let Ok(dir) = std::env::var("PDFIUM_LIB_PATH") {
        builder = builder.pdfium_lib_path(dir);
    }
    builder.build().expect("valid config")
}

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// Store `document` in a fresh store as `docs/<key>`.
async fn stage(document: Vec<u8>, key: &str) -> (tempfile::TempDir, LocalFsStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LocalFsStore::new(dir.path());
    store
        .put_object("docs", key, document, "application/pdf", &ObjectMetadata::new())
        .await
        .expect("stage document");
    (dir, store)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pages_render_in_order_at_dpi_scale() {
    e2e_skip_unless_enabled!();
    let config = e2e_config(OutputFormat::Jpeg, 72);
    let rasterizer = PdfiumRasterizer::from_config(&config);

    let pages = rasterizer
        .rasterize(
            "in/three.pdf",
            multi_page_pdf(&PAGE_WIDTHS),
            RenderOptions::from(&config),
        )
        .await
        .expect("render should succeed");

    assert_eq!(pages.len(), PAGE_WIDTHS.len());
    for (i, (page, width)) in pages.iter().zip(PAGE_WIDTHS).enumerate() {
        assert_eq!(page.index, i);
        // 72 DPI renders one pixel per point.
        assert!(page.image.width().abs_diff(width) <= 1, "page {i}: {}", page.image.width());
        assert!(page.image.height().abs_diff(100) <= 1);
        // JPEG has no alpha channel.
        assert_eq!(page.image.color(), ColorType::Rgb8);
    }
}

#[tokio::test]
async fn test_render_document_to_png() {
    e2e_skip_unless_enabled!();
    let key = "uploads/reports/sample.pdf";
    let (dir, store) = stage(multi_page_pdf(&PAGE_WIDTHS), key).await;
    let config = e2e_config(OutputFormat::Png, 72);
    let rasterizer = PdfiumRasterizer::from_config(&config);

    let outcome = handle_event(&TriggerEvent::new("docs", key), &config, &store, &rasterizer)
        .await
        .expect("conversion should succeed");

    assert_eq!(outcome.page_count, PAGE_WIDTHS.len());
    for (i, out) in outcome.outputs.iter().enumerate() {
        assert_eq!(out, &format!("output/reports/{i}.png"));
        let path = dir.path().join("docs").join(out);
        let img = image::open(&path).expect("valid png");
        assert!(img.width().abs_diff(PAGE_WIDTHS[i]) <= 1);

        let sidecar = store.read_sidecar("docs", out).await.expect("sidecar");
        assert_eq!(sidecar.metadata[META_PAGE_NUMBER], i.to_string());
        assert_eq!(sidecar.metadata[META_PAGE_COUNT], outcome.page_count.to_string());
    }

    println!("{outcome}");
}

#[tokio::test]
async fn test_dpi_scales_pixel_size() {
    e2e_skip_unless_enabled!();
    let key = "uploads/dpi/sample.pdf";
    let (dir, store) = stage(multi_page_pdf(&PAGE_WIDTHS), key).await;

    let mut widths = Vec::new();
    for dpi in [72, 144] {
        let config = e2e_config(OutputFormat::Jpeg, dpi);
        let rasterizer = PdfiumRasterizer::from_config(&config);
        let outcome = handle_event(&TriggerEvent::new("docs", key), &config, &store, &rasterizer)
            .await
            .expect("conversion should succeed");
        let img = image::open(dir.path().join("docs").join(&outcome.outputs[0])).expect("jpeg");
        widths.push(img.width());
    }

    // Doubling DPI doubles the width, give or take rounding.
    let ratio = widths[1] as f32 / widths[0] as f32;
    assert!((ratio - 2.0).abs() < 0.05, "widths: {widths:?}");
}

#[tokio::test]
async fn test_corrupt_pdf_is_decode_error() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LocalFsStore::new(dir.path());
    store
        .put_object(
            "docs",
            "in/broken.pdf",
            b"%PDF-1.7\nthis is not really a pdf".to_vec(),
            "application/pdf",
            &ObjectMetadata::new(),
        )
        .await
        .unwrap();

    let config = e2e_config(OutputFormat::Png, 72);
    let rasterizer = PdfiumRasterizer::from_config(&config);
    let err = handle_event(
        &TriggerEvent::new("docs", "in/broken.pdf"),
        &config,
        &store,
        &rasterizer,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Pdf2ImageError::DecodeError { .. }), "got {err:?}");
    assert!(!dir.path().join("docs/output").exists());
}
