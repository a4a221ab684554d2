//! Amazon S3 [`ObjectStore`] on `aws-sdk-s3`.

use super::{ObjectMetadata, ObjectStore};
use crate::error::StorageError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

/// S3 client wrapper. Cheap to clone; the SDK client is reference counted.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS environment (region,
    /// credentials, `AWS_ENDPOINT_URL` for S3-compatible services).
    pub async fn from_env() -> Self {
        let shared_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(Client::new(&shared_config))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Classify an SDK failure by HTTP status; anything that is not a clear
/// 403/404 keeps the full error chain as its detail.
fn map_sdk_error<E>(err: SdkError<E, HttpResponse>, bucket: &str, key: &str) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    match err.raw_response().map(|r| r.status().as_u16()) {
        Some(404) => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        Some(403) => StorageError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => StorageError::Backend {
            bucket: bucket.to_string(),
            key: key.to_string(),
            detail: DisplayErrorContext(&err).to_string(),
        },
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    StorageError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    map_sdk_error(err, bucket, key)
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend {
                bucket: bucket.to_string(),
                key: key.to_string(),
                detail: format!("failed to read object body: {e}"),
            })?
            .into_bytes();

        debug!(bucket, key, size_bytes = bytes.len(), "Fetched S3 object");
        Ok(bytes.to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        let size_bytes = body.len();
        let request = metadata.iter().fold(
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body))
                .content_type(content_type),
            |req, (k, v)| req.metadata(k, v),
        );

        request
            .send()
            .await
            .map_err(|err| map_sdk_error(err, bucket, key))?;

        debug!(bucket, key, size_bytes, "Uploaded S3 object");
        Ok(())
    }
}
