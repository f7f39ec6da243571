use std::sync::Arc;

use super::{Records, require_items};
use crate::error::ServiceError;
use crate::identity::Identity;
use crate::model::{Bookmark, BookmarkDraft, BookmarkPatch, BookmarkRef, Category, UploadUrl, UploadUrlRequest};
use crate::store::{AttachmentStore, Record};

/// Result of applying one object-store completion event.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachOutcome {
    Attached(Bookmark),
    /// No bookmark carries the object's key; the event is dropped.
    Skipped,
}

#[derive(Clone)]
pub struct BookmarkService {
    records: Records<Bookmark>,
    categories: Records<Category>,
    attachments: Arc<dyn AttachmentStore>,
}

impl BookmarkService {
    pub fn new(
        records: Records<Bookmark>,
        categories: Records<Category>,
        attachments: Arc<dyn AttachmentStore>,
    ) -> Self {
        Self {
            records,
            categories,
            attachments,
        }
    }

    async fn ensure_category(&self, category_id: &str, identity: &Identity) -> Result<(), ServiceError> {
        if self.categories.get_owned(category_id, identity).await?.is_none() {
            tracing::warn!(category_id, user = identity.user_id(), "bookmark references unknown category");
            return Err(ServiceError::Validation("Category does not exist".to_string()));
        }
        Ok(())
    }

    pub async fn create_many(
        &self,
        drafts: Vec<BookmarkDraft>,
        identity: &Identity,
    ) -> Result<Vec<Bookmark>, ServiceError> {
        require_items(&drafts)?;

        for draft in &drafts {
            self.ensure_category(&draft.category_id, identity).await?;
        }

        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(self.records.create(draft, identity).await?);
        }
        Ok(created)
    }

    pub async fn get(&self, id: &str, identity: &Identity) -> Result<Bookmark, ServiceError> {
        self.records.require_owned(id, identity, "view").await
    }

    pub async fn list(&self, identity: &Identity) -> Result<Vec<Bookmark>, ServiceError> {
        self.records.list_owned(identity).await
    }

    pub async fn update(
        &self,
        id: &str,
        identity: &Identity,
        patch: BookmarkPatch,
    ) -> Result<Bookmark, ServiceError> {
        let mut bookmark = self.records.require_owned(id, identity, "update").await?;
        if patch.category_id != bookmark.category_id {
            self.ensure_category(&patch.category_id, identity).await?;
        }

        bookmark.apply(patch);
        self.records.save(&bookmark).await?;
        Ok(bookmark)
    }

    /// Deletes every referenced bookmark and its attachment. All ids are
    /// checked first so a single foreign id leaves the batch untouched.
    pub async fn delete_many(
        &self,
        refs: Vec<BookmarkRef>,
        identity: &Identity,
    ) -> Result<Vec<Bookmark>, ServiceError> {
        require_items(&refs)?;

        let mut owned = Vec::with_capacity(refs.len());
        for r in &refs {
            owned.push(self.records.require_owned(r.id(), identity, "delete").await?);
        }

        self.purge(&owned).await?;
        Ok(owned)
    }

    /// Removes already-verified bookmarks together with their blobs.
    pub(super) async fn purge(&self, bookmarks: &[Bookmark]) -> Result<(), ServiceError> {
        for bookmark in bookmarks {
            self.attachments.delete(&bookmark.bookmark_id).await?;
            self.records.remove(bookmark).await?;
        }
        Ok(())
    }

    pub async fn upload_url(
        &self,
        id: &str,
        request: UploadUrlRequest,
        identity: &Identity,
    ) -> Result<UploadUrl, ServiceError> {
        if request.file_type.trim().is_empty() {
            return Err(ServiceError::missing_payload());
        }

        let bookmark = self.records.require_owned(id, identity, "update").await?;
        tracing::info!(
            bookmark_id = %bookmark.bookmark_id,
            file_name = %request.file_name,
            "issuing attachment upload url"
        );

        let upload_url = self
            .attachments
            .presign_upload(&bookmark.bookmark_id, &request.file_type)
            .await?;
        Ok(UploadUrl { upload_url })
    }

    pub async fn delete_attachment(&self, id: &str, identity: &Identity) -> Result<Bookmark, ServiceError> {
        let mut bookmark = self.records.require_owned(id, identity, "update").await?;

        self.attachments.delete(&bookmark.bookmark_id).await?;
        bookmark.attachment_url = None;
        self.records.save(&bookmark).await?;
        Ok(bookmark)
    }

    /// Records the public location of a freshly uploaded object on the
    /// bookmark whose id is the object key. Runs without a caller identity.
    pub async fn attach_uploaded(&self, key: &str) -> Result<AttachOutcome, ServiceError> {
        let Some(mut bookmark) = self.records.find_by_id(key).await? else {
            tracing::warn!(key, "no bookmark for uploaded object, dropping event");
            return Ok(AttachOutcome::Skipped);
        };

        bookmark.attachment_url = Some(self.attachments.object_url(key));
        self.records.save(&bookmark).await?;
        tracing::info!(bookmark_id = %bookmark.bookmark_id, "attachment recorded");
        Ok(AttachOutcome::Attached(bookmark))
    }
}
