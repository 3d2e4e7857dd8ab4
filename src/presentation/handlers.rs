// HTTP request handlers
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// The summary feed: one line per commit we have data for
pub async fn summary_feed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.feed_service.summary().await {
        Ok(summaries) => Json(summaries).into_response(),
        Err(error) => {
            tracing::error!(%error, "summary feed unavailable");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// One commit's full record, addressed as /<hash>.json
pub async fn commit_record(
    Path(file): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let Some(hash) = file.strip_suffix(".json") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match state.feed_service.detail(hash).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(error) => {
            tracing::error!(%error, hash, "record feed unavailable");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
