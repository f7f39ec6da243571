//! Client data layer.
//!
//! One narrow interface per concern: [`BookmarkApi`] and [`CategoryApi`]
//! for the record endpoints, [`AttachmentUploader`] for the direct upload to
//! a pre-signed URL. [`ApiClient`] and [`UploadClient`] are the HTTP
//! implementations; everything else (view state, import, export, the
//! attachment flow) is written against the traits.

pub mod attachment;
pub mod export;
mod http;
pub mod import;
pub mod view_state;

#[cfg(test)]
pub(crate) mod fake;

pub use http::{ApiClient, UploadClient};

use async_trait::async_trait;

use crate::model::{
    Bookmark, BookmarkDraft, BookmarkPatch, Category, CategoryDraft, CategoryPatch, UploadUrl, UploadUrlRequest,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status and an `{error}` body.
    #[error("{message} ({status})")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BookmarkApi: Send + Sync {
    async fn create_bookmarks(&self, drafts: &[BookmarkDraft]) -> Result<Vec<Bookmark>, ClientError>;
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, ClientError>;
    async fn get_bookmark(&self, id: &str) -> Result<Bookmark, ClientError>;
    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> Result<Bookmark, ClientError>;
    async fn delete_bookmarks(&self, ids: &[String]) -> Result<(), ClientError>;
    async fn upload_url(&self, id: &str, request: &UploadUrlRequest) -> Result<UploadUrl, ClientError>;
    async fn delete_attachment(&self, id: &str) -> Result<(), ClientError>;
}

#[async_trait]
pub trait CategoryApi: Send + Sync {
    async fn create_categories(&self, drafts: &[CategoryDraft]) -> Result<Vec<Category>, ClientError>;
    async fn list_categories(&self) -> Result<Vec<Category>, ClientError>;
    async fn get_category(&self, id: &str) -> Result<Category, ClientError>;
    async fn update_category(&self, id: &str, patch: &CategoryPatch) -> Result<Category, ClientError>;
    async fn delete_categories(&self, ids: &[String]) -> Result<(), ClientError>;
}

#[async_trait]
pub trait AttachmentUploader: Send + Sync {
    /// PUTs `body` to a pre-signed URL.
    async fn upload(&self, upload_url: &str, content_type: &str, body: Vec<u8>) -> Result<(), ClientError>;
}
