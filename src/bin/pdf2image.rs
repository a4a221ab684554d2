//! CLI binary for pdf2image.
//!
//! Runs the same handler the Lambda runs, against a directory tree instead
//! of S3: `<root>/<bucket>/<key>` is an object and page images land in
//! `<root>/<bucket>/output/...` with a `.metadata.json` sidecar each.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2image::{
    handle_event, ConversionConfig, LocalFsStore, ObjectMetadata, ObjectStore, OutputFormat,
    PdfiumRasterizer, TriggerEvent,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a document already stored at ./storage/docs/inbox/a/report.pdf
  pdf2image --root ./storage --bucket docs inbox/a/report.pdf

  # Import a local file as docs/inbox/a/report.pdf, then convert it to JPEG at 150 DPI
  pdf2image --root ./storage --bucket docs --source ~/report.pdf \
            --format jpeg --dpi 150 inbox/a/report.pdf

  # Page images go to <root>/<bucket>/output/<dirs without the first>/<page>.<ext>
  #   inbox/a/report.pdf  →  output/a/0.png, output/a/1.png, …

ENVIRONMENT VARIABLES:
  DPI              Rendering resolution (default 300)
  FMT              Output format: ppm, jpeg, png, tiff (default png)
  ORIGIN_BUCKET    Bucket receiving the page images (default: --bucket)
  PDFIUM_LIB_PATH  Directory containing libpdfium
  RUST_LOG         Log filter, e.g. pdf2image=debug
"#;

/// Rasterise a PDF into per-page images using a local directory as storage.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2image",
    version,
    about = "Rasterise a PDF into per-page images using a local directory as object storage",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Object key of the PDF inside the bucket.
    key: String,

    /// Storage root; each bucket is a sub-directory.
    #[arg(long, env = "PDF2IMAGE_ROOT", default_value = ".")]
    root: PathBuf,

    /// Bucket the document is read from.
    #[arg(short, long, env = "PDF2IMAGE_BUCKET")]
    bucket: String,

    /// Bucket the page images are written to. Defaults to --bucket.
    #[arg(long, env = "ORIGIN_BUCKET", default_value = "")]
    origin_bucket: String,

    /// Copy this local PDF to <bucket>/<key> before converting.
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Rendering DPI.
    #[arg(long, env = "DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(1..))]
    dpi: u32,

    /// Output image format.
    #[arg(short, long, env = "FMT", value_enum, default_value = "png")]
    format: FormatArg,

    /// Directory containing libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Ppm,
    Jpeg,
    Png,
    Tiff,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Ppm => OutputFormat::Ppm,
            FormatArg::Jpeg => OutputFormat::Jpeg,
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Tiff => OutputFormat::Tiff,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let store = LocalFsStore::new(&cli.root);
    let rasterizer = PdfiumRasterizer::from_config(&config);

    // ── Optional import ──────────────────────────────────────────────────
    if let Some(ref source) = cli.source {
        let body = tokio::fs::read(source)
            .await
            .with_context(|| format!("Failed to read {:?}", source))?;
        store
            .put_object(&cli.bucket, &cli.key, body, "application/pdf", &ObjectMetadata::new())
            .await
            .with_context(|| format!("Failed to import {:?} as {}/{}", source, cli.bucket, cli.key))?;
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let event = TriggerEvent::new(&cli.bucket, &cli.key);
    let outcome = handle_event(&event, &config, &store, &rasterizer)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?;
        println!("{json}");
    } else if !cli.quiet {
        let bucket = if config.origin_bucket.is_empty() {
            &cli.bucket
        } else {
            &config.origin_bucket
        };
        for key in &outcome.outputs {
            println!("{}", cli.root.join(bucket).join(key).display());
        }
        eprintln!(
            "{} {}  {}",
            green("✔"),
            outcome,
            dim(&format!("{} pages, {}ms", outcome.page_count, outcome.duration_ms)),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .format(cli.format.into())
        .origin_bucket(cli.origin_bucket.clone());

    if let Some(ref path) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path.clone());
    }

    builder.build().context("Invalid configuration")
}
