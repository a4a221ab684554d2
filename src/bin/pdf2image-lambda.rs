//! AWS Lambda bootstrap for pdf2image.
//!
//! Subscribe the function to `s3:ObjectCreated:*` on the origin bucket.
//! Configuration and the S3 client are resolved once per cold start and
//! shared by every invocation of the container. pdfium is bound once at
//! startup to fail fast, then bound again inside each render.

use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use pdf2image::{
    handle_event, trigger_from_s3_event, ConversionConfig, ObjectStore, PdfiumRasterizer,
    Rasterizer, S3Store,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // CloudWatch adds its own timestamp and renders ANSI escapes literally.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();

    let config = ConversionConfig::from_env();
    let store = S3Store::from_env().await;
    let rasterizer = PdfiumRasterizer::from_config(&config);
    rasterizer.check_binding()?;

    run(service_fn(|event: LambdaEvent<S3Event>| {
        pdf_to_image(event, &config, &store, &rasterizer)
    }))
    .await
}

async fn pdf_to_image(
    event: LambdaEvent<S3Event>,
    config: &ConversionConfig,
    store: &dyn ObjectStore,
    rasterizer: &dyn Rasterizer,
) -> Result<String, Error> {
    let trigger = trigger_from_s3_event(&event.payload)?;

    match handle_event(&trigger, config, store, rasterizer).await {
        Ok(outcome) => Ok(outcome.to_string()),
        Err(e) => {
            error!(bucket = %trigger.bucket, key = %trigger.key, "Conversion failed: {e}");
            Err(e.into())
        }
    }
}
