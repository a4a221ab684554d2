//! Output key derivation.
//!
//! The destination of page `i` of `a/b/c/doc.pdf` is `output/b/c/i.<ext>`:
//! the first path segment and the file name are dropped, the remaining
//! directories are kept under a fixed `output/` root. The document's file
//! name is not part of the output key, so two documents in the same
//! directory publish to the same page keys.

use crate::config::OutputFormat;

/// Fixed directory all page images are written under.
pub const OUTPUT_ROOT: &str = "output";

/// Compute the destination key for page `page_index` (zero-based) of the
/// document stored at `object_key`.
///
/// ```rust
/// use pdf2image::pipeline::keys::derive_output_key;
/// use pdf2image::OutputFormat;
///
/// assert_eq!(derive_output_key("docs/sub/report.pdf", 2, OutputFormat::Png), "output/sub/2.png");
/// assert_eq!(derive_output_key("report.pdf", 0, OutputFormat::Jpeg), "output/0.jpeg");
/// ```
pub fn derive_output_key(object_key: &str, page_index: usize, format: OutputFormat) -> String {
    let mut segments: Vec<&str> = object_key.split('/').collect();
    segments.pop(); // file name

    let middle = segments.get(1..).unwrap_or_default();

    let mut key = String::from(OUTPUT_ROOT);
    for segment in middle {
        key.push('/');
        key.push_str(segment);
    }
    key.push('/');
    key.push_str(&page_index.to_string());
    key.push('.');
    key.push_str(format.extension());
    key
}
