//! Two-step attachment upload: ask the service for a pre-signed URL, then
//! PUT the file straight to the object store. The bookmark's attachment
//! location is filled in later by the store's completion notification, so
//! callers refresh afterwards.

use std::path::Path;

use super::{AttachmentUploader, BookmarkApi, ClientError};
use crate::model::UploadUrlRequest;

pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

pub async fn upload_bytes<A, U>(
    api: &A,
    uploader: &U,
    bookmark_id: &str,
    file_name: &str,
    body: Vec<u8>,
) -> Result<(), ClientError>
where
    A: BookmarkApi + ?Sized,
    U: AttachmentUploader + ?Sized,
{
    let file_type = content_type_for(file_name);
    let request = UploadUrlRequest {
        file_name: file_name.to_string(),
        file_type: file_type.clone(),
    };

    let upload = api.upload_url(bookmark_id, &request).await?;
    tracing::info!(bookmark_id, file_name, bytes = body.len(), "uploading attachment");
    uploader.upload(&upload.upload_url, &file_type, body).await
}

pub async fn upload_file<A, U>(api: &A, uploader: &U, bookmark_id: &str, path: &Path) -> Result<(), ClientError>
where
    A: BookmarkApi + ?Sized,
    U: AttachmentUploader + ?Sized,
{
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ClientError::Validation(format!("not a file: {}", path.display())))?;
    let body = tokio::fs::read(path).await?;

    upload_bytes(api, uploader, bookmark_id, file_name, body).await
}
