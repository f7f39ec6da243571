//! End-to-end tests for the HTTP surface.
//!
//! The router runs in-process over the in-memory store and attachment fakes;
//! requests go through `tower::ServiceExt::oneshot` with HS256 bearer tokens.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

use markstash::handler::AppState;
use markstash::identity::{Claims, IdentityVerifier};
use markstash::routes::app;
use markstash::store::memory::{MemoryAttachments, MemoryStore, UnreliableStore};

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    attachments: Arc<MemoryAttachments>,
}

fn test_app() -> TestApp {
    let attachments = Arc::new(MemoryAttachments::default());
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        attachments.clone(),
        IdentityVerifier::new(Some(SECRET)),
    );
    TestApp {
        router: app(state),
        attachments,
    }
}

fn token(user: &str) -> String {
    let claims = Claims {
        sub: user.to_string(),
        exp: Some(jsonwebtoken::get_current_timestamp() + 3600),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn send(router: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_category(router: &Router, user: &str, name: &str) -> String {
    let (status, body) = send(router, Method::POST, "/categories", Some(user), Some(json!([{ "name": name }]))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["item"][0]["categoryId"].as_str().unwrap().to_string()
}

async fn create_bookmark(router: &Router, user: &str, category_id: &str, name: &str) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/bookmarks",
        Some(user),
        Some(json!([{ "categoryId": category_id, "name": name, "url": format!("https://{name}.example") }])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["item"][0]["bookmarkId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn healthcheck_is_anonymous() {
    let app = test_app();
    let (status, body) = send(&app.router, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "item": "ok" }));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = test_app();
    let (status, body) = send(&app.router, Method::GET, "/bookmarks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn bookmark_crud_round_trip() {
    let app = test_app();
    let category_id = create_category(&app.router, "alice", "Work").await;
    let bookmark_id = create_bookmark(&app.router, "alice", &category_id, "docs").await;

    let (status, body) = send(&app.router, Method::GET, &format!("/bookmarks/{bookmark_id}"), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["userId"], "alice");
    assert_eq!(body["item"]["categoryId"], category_id.as_str());

    let (status, body) = send(
        &app.router,
        Method::PATCH,
        &format!("/bookmarks/{bookmark_id}"),
        Some("alice"),
        Some(json!({ "categoryId": category_id, "name": "Docs", "url": "https://docs.rs", "tag": "rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["name"], "Docs");
    assert_eq!(body["item"]["tag"], "rust");

    let (_, body) = send(&app.router, Method::GET, "/bookmarks", Some("bob"), None).await;
    assert_eq!(body["item"], json!([]));

    let (status, body) = send(
        &app.router,
        Method::DELETE,
        "/bookmarks",
        Some("alice"),
        Some(json!([{ "bookmarkId": bookmark_id }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (_, body) = send(&app.router, Method::GET, "/bookmarks", Some("alice"), None).await;
    assert_eq!(body["item"], json!([]));
    assert_eq!(app.attachments.deleted_keys(), vec![bookmark_id]);
}

#[tokio::test]
async fn bookmark_with_unknown_category_is_rejected() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/bookmarks",
        Some("alice"),
        Some(json!([{ "categoryId": "does-not-exist", "name": "x", "url": "https://x.example" }])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Category does not exist");
}

#[tokio::test]
async fn missing_body_is_a_validation_error() {
    let app = test_app();
    let (status, body) = send(&app.router, Method::POST, "/categories", Some("alice"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request parameter is required but not provided.");

    let (status, _) = send(&app.router, Method::POST, "/categories", Some("alice"), Some(json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attachment_for_foreign_bookmark_is_not_found() {
    let app = test_app();
    let category_id = create_category(&app.router, "alice", "Work").await;
    let bookmark_id = create_bookmark(&app.router, "alice", &category_id, "paper").await;
    let uri = format!("/bookmarks/{bookmark_id}/attachment");
    let request = json!({ "fileName": "paper.pdf", "fileType": "application/pdf" });

    let (status, body) = send(&app.router, Method::POST, &uri, Some("bob"), Some(request.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "Bookmark does not exist or you are not authorized to update the bookmark"
    );
    assert!(app.attachments.calls().is_empty());

    let (status, body) = send(&app.router, Method::POST, &uri, Some("alice"), Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["item"]["uploadUrl"].as_str().unwrap().contains(&bookmark_id));
}

#[tokio::test]
async fn mixed_category_delete_aborts_whole_batch() {
    let app = test_app();
    let mine = create_category(&app.router, "alice", "Mine").await;
    let theirs = create_category(&app.router, "bob", "Theirs").await;

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        "/categories",
        Some("alice"),
        Some(json!([mine, theirs])),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app.router, Method::GET, &format!("/categories/{mine}"), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["name"], "Mine");
}

#[tokio::test]
async fn category_delete_cascades_to_bookmarks() {
    let app = test_app();
    let work = create_category(&app.router, "alice", "Work").await;
    let home = create_category(&app.router, "alice", "Home").await;
    create_bookmark(&app.router, "alice", &work, "one").await;
    create_bookmark(&app.router, "alice", &work, "two").await;
    let kept = create_bookmark(&app.router, "alice", &home, "kept").await;

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        "/categories",
        Some("alice"),
        Some(json!([{ "categoryId": work }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app.router, Method::GET, "/bookmarks", Some("alice"), None).await;
    let ids: Vec<&str> = body["item"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["bookmarkId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![kept.as_str()]);
    assert_eq!(app.attachments.deleted_keys().len(), 2);
}

#[tokio::test]
async fn upload_notification_records_attachment() {
    let app = test_app();
    let category_id = create_category(&app.router, "alice", "Work").await;
    let bookmark_id = create_bookmark(&app.router, "alice", &category_id, "paper").await;

    let s3_event = json!({ "Records": [
        { "s3": { "object": { "key": bookmark_id } } },
        { "s3": { "object": { "key": "unknown" } } },
    ] });
    let envelope = json!({ "Records": [{ "Sns": { "Message": s3_event.to_string() } }] });

    let (status, body) = send(&app.router, Method::POST, "/events/attachments", None, Some(envelope)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"], json!({ "received": 2, "attached": 1, "skipped": 1, "failed": 0 }));

    let (_, body) = send(&app.router, Method::GET, &format!("/bookmarks/{bookmark_id}"), Some("alice"), None).await;
    assert_eq!(
        body["item"]["attachmentUrl"],
        format!("https://attachments.test/{bookmark_id}")
    );

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/bookmarks/{bookmark_id}/attachment"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app.router, Method::GET, &format!("/bookmarks/{bookmark_id}"), Some("alice"), None).await;
    assert!(body["item"].get("attachmentUrl").is_none());
}

#[tokio::test]
async fn store_outage_is_an_internal_error() {
    let store = Arc::new(UnreliableStore::new());
    let router = app(AppState::new(
        store.clone(),
        Arc::new(MemoryAttachments::default()),
        IdentityVerifier::new(Some(SECRET)),
    ));
    store.set_offline(true);

    let (status, body) = send(&router, Method::GET, "/bookmarks", Some("alice"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "store unavailable" }));
}
