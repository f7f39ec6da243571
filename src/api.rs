use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::ServiceError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub item: T,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn success<T: Serialize>(item: T) -> Response {
    (StatusCode::OK, Json(ApiResponse { item })).into_response()
}

pub fn created<T: Serialize>(item: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse { item })).into_response()
}

/// 200 with no body, for deletes.
pub fn empty_ok() -> Response {
    StatusCode::OK.into_response()
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Store(_) | ServiceError::ObjectStorage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => tracing::error!("request failed: {}", error),
            StatusCode::NOT_FOUND => tracing::warn!("{}", error),
            _ => tracing::info!(status = status.as_u16(), "request rejected: {}", error),
        }

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// JSON request body. A missing, non-JSON or malformed body is rejected as a
/// validation error instead of axum's plain-text rejection.
pub struct Payload<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => {
                tracing::warn!("rejected request body: {}", rejection.body_text());
                Err(ServiceError::missing_payload())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServiceError::missing_payload().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::not_found("Category", "view").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Unauthorized("no token".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::from(anyhow::anyhow!("table is locked")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_status() {
        let response = ServiceError::not_found("Bookmark", "update").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
