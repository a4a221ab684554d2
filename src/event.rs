//! The triggering storage notification.
//!
//! [`TriggerEvent`] is the only input the pipeline needs: which bucket and
//! which key were just created. The S3 notification shape from
//! `aws_lambda_events` is converted into it at the edge so the handler can
//! be driven by tests without any AWS types.

use crate::error::Pdf2ImageError;
use aws_lambda_events::event::s3::{S3Event, S3EventRecord};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One object-created notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Bucket the object was created in.
    pub bucket: String,
    /// Full object key, already URL-decoded.
    pub key: String,
}

impl TriggerEvent {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl TryFrom<&S3EventRecord> for TriggerEvent {
    type Error = Pdf2ImageError;

    fn try_from(record: &S3EventRecord) -> Result<Self, Self::Error> {
        let bucket = record
            .s3
            .bucket
            .name
            .clone()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Pdf2ImageError::InvalidEvent("record has no bucket name".into()))?;
        let raw_key = record
            .s3
            .object
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Pdf2ImageError::InvalidEvent("record has no object key".into()))?;

        Ok(Self {
            bucket,
            key: decode_object_key(raw_key)?,
        })
    }
}

/// Pick the trigger out of an S3 notification.
///
/// S3 delivers one record per notification. Should more arrive, only the
/// first is processed and the rest are logged.
pub fn trigger_from_s3_event(event: &S3Event) -> Result<TriggerEvent, Pdf2ImageError> {
    let first = event
        .records
        .first()
        .ok_or_else(|| Pdf2ImageError::InvalidEvent("notification has no records".into()))?;

    if event.records.len() > 1 {
        warn!(
            records = event.records.len(),
            "Notification carries more than one record; only the first is processed"
        );
    }

    TriggerEvent::try_from(first)
}

/// S3 notifications form-encode object keys: spaces arrive as `+`, other
/// reserved characters as `%XX`.
pub fn decode_object_key(raw: &str) -> Result<String, Pdf2ImageError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|k| k.into_owned())
        .map_err(|e| Pdf2ImageError::InvalidEvent(format!("object key {raw:?} is not valid UTF-8: {e}")))
}
