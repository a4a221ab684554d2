//! Configuration for the PDF-to-image pipeline.
//!
//! A [`ConversionConfig`] is resolved exactly once, when the process starts,
//! and is then shared read-only by every invocation of
//! [`crate::handler::handle_event`]. There is no ambient global: the value is
//! passed by reference into the handler.
//!
//! Two ways to obtain one:
//!
//! * [`ConversionConfig::from_env`]: the Lambda path. Reads `DPI`, `FMT`,
//!   `ORIGIN_BUCKET` and `PDFIUM_LIB_PATH`. Bad values never abort startup;
//!   they are logged and the default is kept.
//! * [`ConversionConfig::builder`]: the programmatic path (CLI, tests).
//!   Strict: [`ConversionConfigBuilder::build`] rejects a zero DPI.

use crate::error::Pdf2ImageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable holding the rendering resolution.
pub const ENV_DPI: &str = "DPI";
/// Environment variable holding the output image format.
pub const ENV_FORMAT: &str = "FMT";
/// Environment variable naming the bucket documents arrive in and pages go to.
pub const ENV_ORIGIN_BUCKET: &str = "ORIGIN_BUCKET";
/// Environment variable naming the directory that contains libpdfium.
pub const ENV_PDFIUM_LIB_PATH: &str = "PDFIUM_LIB_PATH";

/// Default rendering resolution in dots per inch.
pub const DEFAULT_DPI: u32 = 300;

/// Above this a US Letter page renders wider than ~10k px per side.
/// Higher values are accepted but logged.
pub const MAX_RECOMMENDED_DPI: u32 = 1200;

/// Process-wide configuration for PDF rasterisation.
///
/// # Example
/// ```rust
/// use pdf2image::{ConversionConfig, OutputFormat};
///
/// let config = ConversionConfig::builder()
///     .dpi(150)
///     .format(OutputFormat::Jpeg)
///     .origin_bucket("scanned-documents")
///     .build()
///     .unwrap();
/// assert_eq!(config.format.extension(), "jpeg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each page. Default: 300.
    pub dpi: u32,

    /// Encoding of the published page images. Default: PNG.
    pub format: OutputFormat,

    /// Bucket that triggers the pipeline and receives its output.
    ///
    /// Empty means "not configured"; the handler then writes back to the
    /// bucket named in the triggering event.
    pub origin_bucket: String,

    /// Directory containing the pdfium shared library. `None` binds to the
    /// system library search path.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            format: OutputFormat::default(),
            origin_bucket: String::new(),
            pdfium_lib_path: None,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration from an arbitrary variable lookup.
    ///
    /// Never fails: each setting that is absent or invalid keeps its
    /// default, and the outcome is logged.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match lookup(ENV_DPI) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(dpi) if dpi > 0 => {
                    info!(dpi, "Using DPI from environment");
                    config.dpi = dpi;
                    config.warn_if_dpi_excessive();
                }
                Ok(_) => warn!(
                    "Couldn't process {ENV_DPI}={raw:?}: must be positive. Using the default: {ENV_DPI}={DEFAULT_DPI}"
                ),
                Err(e) => warn!(
                    "Couldn't process {ENV_DPI}={raw:?}: {e}. Using the default: {ENV_DPI}={DEFAULT_DPI}"
                ),
            },
            None => info!("No {ENV_DPI} environment variable set. Using the default: {ENV_DPI}={DEFAULT_DPI}"),
        }

        match lookup(ENV_FORMAT) {
            Some(raw) => match raw.parse::<OutputFormat>() {
                Ok(format) => {
                    info!(%format, "Using output format from environment");
                    config.format = format;
                }
                Err(_) => warn!(
                    "Couldn't process {ENV_FORMAT}={raw:?}. Only the following formats are supported: {}. Using the default: {ENV_FORMAT}={}",
                    OutputFormat::supported_list(),
                    OutputFormat::default()
                ),
            },
            None => info!(
                "No {ENV_FORMAT} environment variable set. Using the default: {ENV_FORMAT}={}",
                OutputFormat::default()
            ),
        }

        match lookup(ENV_ORIGIN_BUCKET) {
            Some(bucket) if !bucket.is_empty() => {
                info!(
                    bucket = %bucket,
                    "Setting the origin bucket. Be sure to set the S3 bucket trigger on the function's configuration"
                );
                config.origin_bucket = bucket;
            }
            _ => warn!(
                "{ENV_ORIGIN_BUCKET} is not set; pages will be written back to the bucket named in each event. \
                 Be sure to set the S3 bucket trigger on the function's configuration"
            ),
        }

        if let Some(path) = lookup(ENV_PDFIUM_LIB_PATH).filter(|p| !p.is_empty()) {
            info!(path = %path, "Using pdfium library directory from environment");
            config.pdfium_lib_path = Some(PathBuf::from(path));
        }

        config
    }

    /// True when `dpi` is above [`MAX_RECOMMENDED_DPI`].
    pub fn dpi_exceeds_recommended(&self) -> bool {
        self.dpi > MAX_RECOMMENDED_DPI
    }

    fn warn_if_dpi_excessive(&self) {
        if self.dpi_exceeds_recommended() {
            warn!(
                dpi = self.dpi,
                max_recommended = MAX_RECOMMENDED_DPI,
                "DPI is very high; each page bitmap grows with the square of the DPI"
            );
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn origin_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.origin_bucket = bucket.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2ImageError> {
        if self.config.dpi == 0 {
            return Err(Pdf2ImageError::InvalidConfig(
                "DPI must be a positive integer".into(),
            ));
        }
        self.config.warn_if_dpi_excessive();
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Encoding of the published page images.
///
/// Parsing is case-sensitive: `"png"` is accepted, `"PNG"` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Binary portable pixmap (P6).
    Ppm,
    Jpeg,
    /// Lossless, keeps alpha. (default)
    #[default]
    Png,
    Tiff,
}

impl OutputFormat {
    /// Every supported format, in the order they are listed to users.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Ppm,
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Tiff,
    ];

    /// File extension used in output keys (no leading dot).
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Ppm => "ppm",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Tiff => "tiff",
        }
    }

    /// MIME type attached to uploaded objects.
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Ppm => "image/x-portable-pixmap",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Tiff => "image/tiff",
        }
    }

    /// Whether the encoding can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        matches!(self, OutputFormat::Png | OutputFormat::Tiff)
    }

    /// The `image` crate codec for this format.
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            OutputFormat::Ppm => image::ImageFormat::Pnm,
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Tiff => image::ImageFormat::Tiff,
        }
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.extension())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Pdf2ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == s)
            .ok_or_else(|| {
                Pdf2ImageError::InvalidConfig(format!(
                    "unsupported format '{s}', expected one of: {}",
                    Self::supported_list()
                ))
            })
    }
}
