use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::handler::{self, AppState};
use crate::notification;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::healthcheck))
        .route(
            "/bookmarks",
            get(handler::list_bookmarks)
                .post(handler::create_bookmarks)
                .delete(handler::delete_bookmarks),
        )
        .route(
            "/bookmarks/:id",
            get(handler::get_bookmark).patch(handler::update_bookmark),
        )
        .route(
            "/bookmarks/:id/attachment",
            post(handler::create_upload_url).delete(handler::delete_attachment),
        )
        .route(
            "/categories",
            get(handler::list_categories)
                .post(handler::create_categories)
                .delete(handler::delete_categories),
        )
        .route(
            "/categories/:id",
            get(handler::get_category).patch(handler::update_category),
        )
        .nest("/events", notification::routes())
}

/// The full service: routes, CORS and state.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    routes().layer(cors).with_state(state)
}
