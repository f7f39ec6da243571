//! In-memory [`OwnedStore`] and [`AttachmentStore`] implementations.
//!
//! Records are kept as serialized JSON documents keyed by
//! `(table, owner, id)`, the same flat layout the libsql backend persists.
//! The attachment fake keeps a log of every presign and delete call so tests
//! can assert on side effects.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use anyhow::Result;
use async_trait::async_trait;

use super::{AttachmentStore, OwnedStore, Record};
use crate::error::ObjectStorageError;

type DocumentKey = (&'static str, String, String);

#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocumentKey, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key<T: Record>(owner: &str, id: &str) -> DocumentKey {
        (T::COLLECTION.table, owner.to_string(), id.to_string())
    }
}

#[async_trait]
impl<T: Record> OwnedStore<T> for MemoryStore {
    async fn put(&self, record: &T) -> Result<()> {
        let document = serde_json::to_value(record)?;
        let mut documents = self
            .documents
            .write()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {e}"))?;
        documents.insert(Self::key::<T>(record.owner(), record.id()), document);
        Ok(())
    }

    async fn get(&self, owner: &str, id: &str) -> Result<Option<T>> {
        let documents = self
            .documents
            .read()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {e}"))?;
        documents
            .get(&Self::key::<T>(owner, id))
            .map(|doc| serde_json::from_value(doc.clone()))
            .transpose()
            .map_err(Into::into)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        let documents = self
            .documents
            .read()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {e}"))?;
        documents
            .iter()
            .find(|((table, _, record_id), _)| *table == T::COLLECTION.table && record_id == id)
            .map(|(_, doc)| serde_json::from_value(doc.clone()))
            .transpose()
            .map_err(Into::into)
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<T>> {
        let documents = self
            .documents
            .read()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {e}"))?;
        let mut records = Vec::new();
        for ((table, record_owner, _), doc) in documents.iter() {
            if *table == T::COLLECTION.table && record_owner == owner {
                records.push(serde_json::from_value(doc.clone())?);
            }
        }
        Ok(records)
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {e}"))?;
        documents.remove(&Self::key::<T>(owner, id));
        Ok(())
    }
}

/// A [`MemoryStore`] whose writes to chosen ids fail, and which can be taken
/// offline entirely. Failures surface as "store unavailable".
#[derive(Default)]
pub struct UnreliableStore {
    inner: MemoryStore,
    offline: AtomicBool,
    failing_puts: Mutex<HashSet<String>>,
}

impl UnreliableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fail_put(&self, id: &str) {
        if let Ok(mut ids) = self.failing_puts.lock() {
            ids.insert(id.to_string());
        }
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> OwnedStore<T> for UnreliableStore {
    async fn put(&self, record: &T) -> Result<()> {
        self.check()?;
        let rejected = self
            .failing_puts
            .lock()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {e}"))?
            .contains(record.id());
        if rejected {
            anyhow::bail!("store unavailable");
        }
        OwnedStore::<T>::put(&self.inner, record).await
    }

    async fn get(&self, owner: &str, id: &str) -> Result<Option<T>> {
        self.check()?;
        OwnedStore::<T>::get(&self.inner, owner, id).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.check()?;
        OwnedStore::<T>::find_by_id(&self.inner, id).await
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<T>> {
        self.check()?;
        OwnedStore::<T>::list_by_owner(&self.inner, owner).await
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        self.check()?;
        OwnedStore::<T>::delete(&self.inner, owner, id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentCall {
    Presign { key: String, content_type: String },
    Delete { key: String },
}

pub struct MemoryAttachments {
    base_url: String,
    calls: Mutex<Vec<AttachmentCall>>,
}

impl MemoryAttachments {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<AttachmentCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                AttachmentCall::Delete { key } => Some(key),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: AttachmentCall) -> Result<(), ObjectStorageError> {
        self.calls
            .lock()
            .map_err(|e| ObjectStorageError::LockError(e.to_string()))?
            .push(call);
        Ok(())
    }
}

impl Default for MemoryAttachments {
    fn default() -> Self {
        Self::new("https://attachments.test")
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachments {
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, ObjectStorageError> {
        self.record(AttachmentCall::Presign {
            key: key.to_string(),
            content_type: content_type.to_string(),
        })?;
        Ok(format!("{}/{}?signature=test", self.base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStorageError> {
        self.record(AttachmentCall::Delete { key: key.to_string() })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
