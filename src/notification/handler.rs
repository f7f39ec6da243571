use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use super::{apply_events, parse_events};
use crate::api::success;
use crate::handler::AppState;

/// Takes the raw body: SNS posts its envelope as `text/plain`.
pub async fn attachment_events(State(state): State<AppState>, body: String) -> Response {
    let events = match parse_events(&body) {
        Ok(events) => events,
        Err(e) => return e.into_response(),
    };

    let summary = apply_events(&state.bookmarks, events).await;
    tracing::info!(
        received = summary.received,
        attached = summary.attached,
        skipped = summary.skipped,
        failed = summary.failed,
        "processed attachment notification"
    );
    success(summary)
}
