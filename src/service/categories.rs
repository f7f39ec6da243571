use std::collections::HashSet;

use super::{BookmarkService, Records, require_items};
use crate::error::ServiceError;
use crate::identity::Identity;
use crate::model::{Category, CategoryDraft, CategoryPatch, CategoryRef};

#[derive(Clone)]
pub struct CategoryService {
    records: Records<Category>,
    bookmarks: BookmarkService,
}

impl CategoryService {
    pub fn new(records: Records<Category>, bookmarks: BookmarkService) -> Self {
        Self { records, bookmarks }
    }

    pub async fn create_many(
        &self,
        drafts: Vec<CategoryDraft>,
        identity: &Identity,
    ) -> Result<Vec<Category>, ServiceError> {
        require_items(&drafts)?;

        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(self.records.create(draft, identity).await?);
        }
        Ok(created)
    }

    pub async fn get(&self, id: &str, identity: &Identity) -> Result<Category, ServiceError> {
        self.records.require_owned(id, identity, "view").await
    }

    pub async fn list(&self, identity: &Identity) -> Result<Vec<Category>, ServiceError> {
        self.records.list_owned(identity).await
    }

    pub async fn update(
        &self,
        id: &str,
        identity: &Identity,
        patch: CategoryPatch,
    ) -> Result<Category, ServiceError> {
        self.records.update(id, identity, patch).await
    }

    /// Deletes the referenced categories, then every bookmark the caller has
    /// filed under any of them (with attachments). Not atomic: a failure
    /// part-way leaves whatever was already removed removed.
    pub async fn delete_many(
        &self,
        refs: Vec<CategoryRef>,
        identity: &Identity,
    ) -> Result<Vec<Category>, ServiceError> {
        require_items(&refs)?;

        let mut owned = Vec::with_capacity(refs.len());
        for r in &refs {
            owned.push(self.records.require_owned(r.id(), identity, "delete").await?);
        }

        for category in &owned {
            self.records.remove(category).await?;
        }

        let deleted: HashSet<&str> = owned.iter().map(|c| c.category_id.as_str()).collect();
        let orphans: Vec<_> = self
            .bookmarks
            .list(identity)
            .await?
            .into_iter()
            .filter(|b| deleted.contains(b.category_id.as_str()))
            .collect();

        tracing::info!(
            categories = owned.len(),
            bookmarks = orphans.len(),
            user = identity.user_id(),
            "cascading category delete"
        );
        self.bookmarks.purge(&orphans).await?;

        Ok(owned)
    }
}
