//! In-process stand-in for the service, for client-side tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use super::{AttachmentUploader, BookmarkApi, CategoryApi, ClientError};
use crate::model::{
    Bookmark, BookmarkDraft, BookmarkPatch, Category, CategoryDraft, CategoryPatch, UploadUrl, UploadUrlRequest,
};
use crate::store::Record;

#[derive(Default)]
pub(crate) struct FakeState {
    pub bookmarks: Vec<Bookmark>,
    pub categories: Vec<Category>,
    pub create_category_calls: usize,
    pub create_bookmark_calls: usize,
    pub uploads: Vec<(String, String, usize)>,
    next_id: u32,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn with_categories(names: &[&str]) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            for name in names {
                let category = state.new_category(CategoryDraft { name: name.to_string() });
                state.categories.push(category);
            }
        }
        fake
    }

    pub fn snapshot(&self) -> (Vec<Category>, Vec<Bookmark>) {
        let state = self.state.lock().unwrap();
        (state.categories.clone(), state.bookmarks.clone())
    }
}

impl FakeState {
    fn next(&mut self, prefix: &str) -> (String, chrono::DateTime<Utc>) {
        self.next_id += 1;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (
            format!("{prefix}-{}", self.next_id),
            base + Duration::seconds(self.next_id as i64),
        )
    }

    fn new_category(&mut self, draft: CategoryDraft) -> Category {
        let (id, now) = self.next("cat");
        Category::from_draft(draft, id, "tester", now)
    }

    fn new_bookmark(&mut self, draft: BookmarkDraft) -> Bookmark {
        let (id, now) = self.next("bm");
        Bookmark::from_draft(draft, id, "tester", now)
    }
}

fn missing(kind: &str) -> ClientError {
    ClientError::Api {
        status: 404,
        message: format!("{kind} does not exist"),
    }
}

#[async_trait]
impl BookmarkApi for FakeApi {
    async fn create_bookmarks(&self, drafts: &[BookmarkDraft]) -> Result<Vec<Bookmark>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.create_bookmark_calls += 1;
        let created: Vec<Bookmark> = drafts.iter().cloned().map(|d| state.new_bookmark(d)).collect();
        state.bookmarks.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, ClientError> {
        Ok(self.state.lock().unwrap().bookmarks.clone())
    }

    async fn get_bookmark(&self, id: &str) -> Result<Bookmark, ClientError> {
        let state = self.state.lock().unwrap();
        state
            .bookmarks
            .iter()
            .find(|b| b.bookmark_id == id)
            .cloned()
            .ok_or_else(|| missing("Bookmark"))
    }

    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> Result<Bookmark, ClientError> {
        let mut state = self.state.lock().unwrap();
        let bookmark = state
            .bookmarks
            .iter_mut()
            .find(|b| b.bookmark_id == id)
            .ok_or_else(|| missing("Bookmark"))?;
        bookmark.apply(patch.clone());
        Ok(bookmark.clone())
    }

    async fn delete_bookmarks(&self, ids: &[String]) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.bookmarks.retain(|b| !ids.contains(&b.bookmark_id));
        Ok(())
    }

    async fn upload_url(&self, id: &str, request: &UploadUrlRequest) -> Result<UploadUrl, ClientError> {
        self.get_bookmark(id).await?;
        Ok(UploadUrl {
            upload_url: format!("https://uploads.test/{id}?type={}", request.file_type),
        })
    }

    async fn delete_attachment(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        let bookmark = state
            .bookmarks
            .iter_mut()
            .find(|b| b.bookmark_id == id)
            .ok_or_else(|| missing("Bookmark"))?;
        bookmark.attachment_url = None;
        Ok(())
    }
}

#[async_trait]
impl CategoryApi for FakeApi {
    async fn create_categories(&self, drafts: &[CategoryDraft]) -> Result<Vec<Category>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.create_category_calls += 1;
        let created: Vec<Category> = drafts.iter().cloned().map(|d| state.new_category(d)).collect();
        state.categories.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        Ok(self.state.lock().unwrap().categories.clone())
    }

    async fn get_category(&self, id: &str) -> Result<Category, ClientError> {
        let state = self.state.lock().unwrap();
        state
            .categories
            .iter()
            .find(|c| c.category_id == id)
            .cloned()
            .ok_or_else(|| missing("Category"))
    }

    async fn update_category(&self, id: &str, patch: &CategoryPatch) -> Result<Category, ClientError> {
        let mut state = self.state.lock().unwrap();
        let category = state
            .categories
            .iter_mut()
            .find(|c| c.category_id == id)
            .ok_or_else(|| missing("Category"))?;
        category.apply(patch.clone());
        Ok(category.clone())
    }

    async fn delete_categories(&self, ids: &[String]) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.categories.retain(|c| !ids.contains(&c.category_id));
        state.bookmarks.retain(|b| !ids.contains(&b.category_id));
        Ok(())
    }
}

#[async_trait]
impl AttachmentUploader for FakeApi {
    async fn upload(&self, upload_url: &str, content_type: &str, body: Vec<u8>) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state
            .uploads
            .push((upload_url.to_string(), content_type.to_string(), body.len()));
        Ok(())
    }
}
