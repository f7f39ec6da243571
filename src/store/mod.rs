//! Storage seams for owned records and their attachments.
//!
//! [`OwnedStore`] is the key-value contract the record services are written
//! against: records are addressed by `(owner, id)`, with a secondary lookup
//! by id alone for callers that carry no identity. [`AttachmentStore`] covers
//! the object store holding one blob per bookmark.
//!
//! Backends:
//!
//! - [`crate::db::Database`] (libsql, local file or embedded replica)
//! - [`crate::s3::ObjectStorage`] (S3-compatible object storage)
//! - [`memory::MemoryStore`] and [`memory::MemoryAttachments`] for tests

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ObjectStorageError;

/// Where a record type lives in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    /// Human-facing name used in error messages, e.g. `"Bookmark"`.
    pub kind: &'static str,
    pub table: &'static str,
    pub id_column: &'static str,
}

/// A record owned by exactly one user.
///
/// The owner and id are stamped at creation and never change afterwards;
/// updates go through [`Record::apply`], which only touches the mutable
/// fields.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Draft: Send;
    type Patch: Send;

    const COLLECTION: Collection;

    fn id(&self) -> &str;
    fn owner(&self) -> &str;
    fn from_draft(draft: Self::Draft, id: String, owner: &str, now: DateTime<Utc>) -> Self;
    fn apply(&mut self, patch: Self::Patch);
}

#[async_trait]
pub trait OwnedStore<T: Record>: Send + Sync {
    /// Inserts or replaces the record stored under `(owner, id)`.
    async fn put(&self, record: &T) -> Result<()>;
    async fn get(&self, owner: &str, id: &str) -> Result<Option<T>>;
    /// Secondary-index lookup; ignores ownership.
    async fn find_by_id(&self, id: &str) -> Result<Option<T>>;
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<T>>;
    async fn delete(&self, owner: &str, id: &str) -> Result<()>;
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Returns a time-limited URL that accepts a single PUT of `key`.
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, ObjectStorageError>;
    /// Deleting a key that does not exist succeeds.
    async fn delete(&self, key: &str) -> Result<(), ObjectStorageError>;
    /// Public location recorded on the bookmark once an upload completes.
    fn object_url(&self, key: &str) -> String;
}
