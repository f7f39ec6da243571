use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, header::CONTENT_TYPE};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{AttachmentUploader, BookmarkApi, CategoryApi, ClientError};
use crate::model::{
    Bookmark, BookmarkDraft, BookmarkPatch, BookmarkRef, Category, CategoryDraft, CategoryPatch, CategoryRef,
    UploadUrl, UploadUrlRequest,
};

#[derive(Debug, Deserialize)]
struct ItemBody<T> {
    item: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Bearer-authenticated client for the record endpoints.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, token)
    }

    pub fn with_client(client: reqwest::Client, api_url: &str, token: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
    }

    async fn item<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = ensure_success(request.send().await?).await?;
        let body: ItemBody<T> = response.json().await?;
        Ok(body.item)
    }

    async fn empty(request: RequestBuilder) -> Result<(), ClientError> {
        ensure_success(request.send().await?).await?;
        Ok(())
    }
}

/// Turns a non-2xx response into [`ClientError::Api`], preferring the
/// service's `{error}` message over the raw body.
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.is_empty() => status.canonical_reason().unwrap_or("request failed").to_string(),
        Err(_) => body,
    };

    tracing::warn!(status = status.as_u16(), "api request failed: {}", message);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl BookmarkApi for ApiClient {
    async fn create_bookmarks(&self, drafts: &[BookmarkDraft]) -> Result<Vec<Bookmark>, ClientError> {
        Self::item(self.request(Method::POST, "/bookmarks").json(drafts)).await
    }

    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, ClientError> {
        Self::item(self.request(Method::GET, "/bookmarks")).await
    }

    async fn get_bookmark(&self, id: &str) -> Result<Bookmark, ClientError> {
        Self::item(self.request(Method::GET, &format!("/bookmarks/{id}"))).await
    }

    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> Result<Bookmark, ClientError> {
        Self::item(self.request(Method::PATCH, &format!("/bookmarks/{id}")).json(patch)).await
    }

    async fn delete_bookmarks(&self, ids: &[String]) -> Result<(), ClientError> {
        let refs: Vec<BookmarkRef> = ids
            .iter()
            .map(|id| BookmarkRef::Keyed {
                bookmark_id: id.clone(),
            })
            .collect();
        Self::empty(self.request(Method::DELETE, "/bookmarks").json(&refs)).await
    }

    async fn upload_url(&self, id: &str, request: &UploadUrlRequest) -> Result<UploadUrl, ClientError> {
        Self::item(
            self.request(Method::POST, &format!("/bookmarks/{id}/attachment"))
                .json(request),
        )
        .await
    }

    async fn delete_attachment(&self, id: &str) -> Result<(), ClientError> {
        Self::empty(self.request(Method::DELETE, &format!("/bookmarks/{id}/attachment"))).await
    }
}

#[async_trait]
impl CategoryApi for ApiClient {
    async fn create_categories(&self, drafts: &[CategoryDraft]) -> Result<Vec<Category>, ClientError> {
        Self::item(self.request(Method::POST, "/categories").json(drafts)).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        Self::item(self.request(Method::GET, "/categories")).await
    }

    async fn get_category(&self, id: &str) -> Result<Category, ClientError> {
        Self::item(self.request(Method::GET, &format!("/categories/{id}"))).await
    }

    async fn update_category(&self, id: &str, patch: &CategoryPatch) -> Result<Category, ClientError> {
        Self::item(self.request(Method::PATCH, &format!("/categories/{id}")).json(patch)).await
    }

    async fn delete_categories(&self, ids: &[String]) -> Result<(), ClientError> {
        let refs: Vec<CategoryRef> = ids
            .iter()
            .map(|id| CategoryRef::Keyed {
                category_id: id.clone(),
            })
            .collect();
        Self::empty(self.request(Method::DELETE, "/categories").json(&refs)).await
    }
}

/// Unauthenticated client for pre-signed uploads; the URL carries the
/// credentials.
#[derive(Clone, Default)]
pub struct UploadClient {
    client: reqwest::Client,
}

impl UploadClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttachmentUploader for UploadClient {
    async fn upload(&self, upload_url: &str, content_type: &str, body: Vec<u8>) -> Result<(), ClientError> {
        let response = self
            .client
            .put(upload_url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
