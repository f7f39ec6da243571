//! Object-store completion notifications.
//!
//! The bucket reports finished uploads either wrapped in an SNS envelope
//! (`Records[].Sns.Message` holding an S3 event as a JSON string) or as a
//! plain S3 event (`Records[].s3.object.key`). Each object key is a bookmark
//! id; the matching bookmark gets its attachment location filled in.
//!
//! Records are handled one at a time. A record for an unknown bookmark is
//! logged and dropped, and a record that fails is logged and skipped, so one
//! bad record never sinks the rest of the batch.

mod handler;
mod routes;

pub use routes::routes;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::service::{AttachOutcome, BookmarkService};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Records", default)]
    records: Vec<EnvelopeRecord>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeRecord {
    #[serde(rename = "Sns")]
    sns: Option<SnsMessage>,
    s3: Option<S3Entity>,
}

#[derive(Debug, Deserialize)]
struct SnsMessage {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

/// Object keys carried by one notification body.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ObjectEvents {
    pub keys: Vec<String>,
    /// Records that could not be read (bad SNS message, no object key).
    pub malformed: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSummary {
    pub received: usize,
    pub attached: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// S3 event keys are form-encoded: `+` is a space and everything else is
/// percent-escaped.
pub fn decode_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::warn!(key = raw, "object key is not valid utf-8 once decoded: {}", e);
            raw.to_string()
        }
    }
}

/// Parses a notification body. Only an unreadable outer envelope is an
/// error; problems inside individual records are counted as malformed.
pub fn parse_events(body: &str) -> Result<ObjectEvents, ServiceError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| {
        tracing::warn!("unreadable notification envelope: {}", e);
        ServiceError::Validation("Notification body is not a valid event".to_string())
    })?;

    let mut events = ObjectEvents::default();
    for record in envelope.records {
        match (record.sns, record.s3) {
            (Some(sns), _) => match serde_json::from_str::<Envelope>(&sns.message) {
                Ok(inner) => {
                    for inner_record in inner.records {
                        match inner_record.s3 {
                            Some(s3) => events.keys.push(decode_key(&s3.object.key)),
                            None => events.malformed += 1,
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("unreadable s3 event in sns message: {}", e);
                    events.malformed += 1;
                }
            },
            (None, Some(s3)) => events.keys.push(decode_key(&s3.object.key)),
            (None, None) => events.malformed += 1,
        }
    }

    Ok(events)
}

/// Records every uploaded object on its bookmark.
pub async fn apply_events(bookmarks: &BookmarkService, events: ObjectEvents) -> NotificationSummary {
    let mut summary = NotificationSummary {
        received: events.keys.len() + events.malformed,
        failed: events.malformed,
        ..Default::default()
    };

    for key in events.keys {
        tracing::info!(key = %key, "processing uploaded object");
        match bookmarks.attach_uploaded(&key).await {
            Ok(AttachOutcome::Attached(_)) => summary.attached += 1,
            Ok(AttachOutcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                tracing::error!(key = %key, "failed to record attachment: {}", e);
                summary.failed += 1;
            }
        }
    }

    summary
}
