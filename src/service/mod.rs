//! Record services.
//!
//! [`Records`] is the owned-record repository shared by both entity types:
//! it stamps ids and owners on creation and runs the ownership check in
//! front of every read and write. [`BookmarkService`] and
//! [`CategoryService`] compose it with the attachment store and with each
//! other's collection for the cross-entity rules (category validation on
//! bookmark writes, cascade on category delete).
//!
//! Every multi-record operation runs sequentially and stops at the first
//! failure. Nothing is transactional across records.

mod bookmarks;
mod categories;

pub use bookmarks::{AttachOutcome, BookmarkService};
pub use categories::CategoryService;

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;

use crate::error::ServiceError;
use crate::identity::Identity;
use crate::store::{OwnedStore, Record};

pub struct Records<T: Record> {
    store: Arc<dyn OwnedStore<T>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Records<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Records<T> {
    pub fn new(store: Arc<dyn OwnedStore<T>>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub async fn create(&self, draft: T::Draft, identity: &Identity) -> Result<T, ServiceError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = T::from_draft(draft, id, identity.user_id(), Utc::now());
        tracing::info!(kind = T::COLLECTION.kind, id = record.id(), "creating record");
        self.store.put(&record).await?;
        Ok(record)
    }

    pub async fn get_owned(&self, id: &str, identity: &Identity) -> Result<Option<T>, ServiceError> {
        let record = self.store.get(identity.user_id(), id).await?;
        // the store is keyed by owner already; this guards backends that
        // fall back to an id-only lookup
        Ok(record.filter(|r| r.owner() == identity.user_id()))
    }

    /// Like [`Records::get_owned`], with a missing record turned into the
    /// caller-facing not-found error for `action`.
    pub async fn require_owned(
        &self,
        id: &str,
        identity: &Identity,
        action: &'static str,
    ) -> Result<T, ServiceError> {
        match self.get_owned(id, identity).await? {
            Some(record) => Ok(record),
            None => {
                let err = ServiceError::not_found(T::COLLECTION.kind, action);
                tracing::warn!(id, user = identity.user_id(), "{}", err);
                Err(err)
            }
        }
    }

    pub async fn list_owned(&self, identity: &Identity) -> Result<Vec<T>, ServiceError> {
        Ok(self.store.list_by_owner(identity.user_id()).await?)
    }

    pub async fn update(
        &self,
        id: &str,
        identity: &Identity,
        patch: T::Patch,
    ) -> Result<T, ServiceError> {
        let mut record = self.require_owned(id, identity, "update").await?;
        record.apply(patch);
        self.store.put(&record).await?;
        Ok(record)
    }

    /// Writes a record fetched earlier through this repository.
    pub async fn save(&self, record: &T) -> Result<(), ServiceError> {
        Ok(self.store.put(record).await?)
    }

    pub async fn delete(&self, id: &str, identity: &Identity) -> Result<T, ServiceError> {
        let record = self.require_owned(id, identity, "delete").await?;
        self.remove(&record).await?;
        Ok(record)
    }

    async fn remove(&self, record: &T) -> Result<(), ServiceError> {
        tracing::info!(kind = T::COLLECTION.kind, id = record.id(), "deleting record");
        Ok(self.store.delete(record.owner(), record.id()).await?)
    }

    /// Id-only lookup that skips the ownership check. Only for callers that
    /// carry no identity, such as object-store notifications.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>, ServiceError> {
        Ok(self.store.find_by_id(id).await?)
    }
}

fn require_items<T>(items: &[T]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::missing_payload());
    }
    Ok(())
}
