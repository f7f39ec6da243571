use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::api::{Payload, created, empty_ok, success};
use crate::identity::{Identity, IdentityVerifier};
use crate::model::{
    Bookmark, BookmarkDraft, BookmarkPatch, BookmarkRef, Category, CategoryDraft, CategoryPatch, CategoryRef,
    UploadUrlRequest,
};
use crate::service::{BookmarkService, CategoryService, Records};
use crate::store::{AttachmentStore, OwnedStore};

#[derive(Clone)]
pub struct AppState {
    pub bookmarks: BookmarkService,
    pub categories: CategoryService,
    pub identity: IdentityVerifier,
}

impl AppState {
    /// Wires both record services over one store handle.
    pub fn new<S>(store: Arc<S>, attachments: Arc<dyn AttachmentStore>, identity: IdentityVerifier) -> Self
    where
        S: OwnedStore<Bookmark> + OwnedStore<Category> + 'static,
    {
        let categories: Records<Category> = Records::new(store.clone());
        let bookmarks = BookmarkService::new(Records::new(store), categories.clone(), attachments);

        AppState {
            categories: CategoryService::new(categories, bookmarks.clone()),
            bookmarks,
            identity,
        }
    }
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    success("ok")
}

// bookmarks

pub async fn create_bookmarks(
    State(state): State<AppState>,
    identity: Identity,
    Payload(drafts): Payload<Vec<BookmarkDraft>>,
) -> Response {
    info!(user = identity.user_id(), count = drafts.len(), "creating bookmarks");
    match state.bookmarks.create_many(drafts, &identity).await {
        Ok(items) => created(items),
        Err(e) => e.into_response(),
    }
}

pub async fn list_bookmarks(State(state): State<AppState>, identity: Identity) -> Response {
    info!(user = identity.user_id(), "listing bookmarks");
    match state.bookmarks.list(&identity).await {
        Ok(items) => success(items),
        Err(e) => e.into_response(),
    }
}

pub async fn get_bookmark(State(state): State<AppState>, identity: Identity, Path(id): Path<String>) -> Response {
    info!(user = identity.user_id(), id = %id, "getting bookmark");
    match state.bookmarks.get(&id, &identity).await {
        Ok(item) => success(item),
        Err(e) => e.into_response(),
    }
}

pub async fn update_bookmark(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Payload(patch): Payload<BookmarkPatch>,
) -> Response {
    info!(user = identity.user_id(), id = %id, "updating bookmark");
    match state.bookmarks.update(&id, &identity, patch).await {
        Ok(item) => success(item),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_bookmarks(
    State(state): State<AppState>,
    identity: Identity,
    Payload(refs): Payload<Vec<BookmarkRef>>,
) -> Response {
    info!(user = identity.user_id(), count = refs.len(), "deleting bookmarks");
    match state.bookmarks.delete_many(refs, &identity).await {
        Ok(_) => empty_ok(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_upload_url(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Payload(request): Payload<UploadUrlRequest>,
) -> Response {
    info!(user = identity.user_id(), id = %id, "requesting attachment upload url");
    match state.bookmarks.upload_url(&id, request, &identity).await {
        Ok(url) => success(url),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Response {
    info!(user = identity.user_id(), id = %id, "deleting attachment");
    match state.bookmarks.delete_attachment(&id, &identity).await {
        Ok(_) => empty_ok(),
        Err(e) => e.into_response(),
    }
}

// categories

pub async fn create_categories(
    State(state): State<AppState>,
    identity: Identity,
    Payload(drafts): Payload<Vec<CategoryDraft>>,
) -> Response {
    info!(user = identity.user_id(), count = drafts.len(), "creating categories");
    match state.categories.create_many(drafts, &identity).await {
        Ok(items) => created(items),
        Err(e) => e.into_response(),
    }
}

pub async fn list_categories(State(state): State<AppState>, identity: Identity) -> Response {
    info!(user = identity.user_id(), "listing categories");
    match state.categories.list(&identity).await {
        Ok(items) => success(items),
        Err(e) => e.into_response(),
    }
}

pub async fn get_category(State(state): State<AppState>, identity: Identity, Path(id): Path<String>) -> Response {
    info!(user = identity.user_id(), id = %id, "getting category");
    match state.categories.get(&id, &identity).await {
        Ok(item) => success(item),
        Err(e) => e.into_response(),
    }
}

pub async fn update_category(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Payload(patch): Payload<CategoryPatch>,
) -> Response {
    info!(user = identity.user_id(), id = %id, "updating category");
    match state.categories.update(&id, &identity, patch).await {
        Ok(item) => success(item),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_categories(
    State(state): State<AppState>,
    identity: Identity,
    Payload(refs): Payload<Vec<CategoryRef>>,
) -> Response {
    info!(user = identity.user_id(), count = refs.len(), "deleting categories");
    match state.categories.delete_many(refs, &identity).await {
        Ok(_) => empty_ok(),
        Err(e) => e.into_response(),
    }
}
