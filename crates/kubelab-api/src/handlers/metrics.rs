//! Prometheus scrape endpoint

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

use crate::error::Result;
use crate::server::AppState;

/// `GET /metrics`
///
/// Recounts items with a full key scan before rendering, so the gauge is exact
/// at scrape time and a store failure fails the scrape.
pub async fn metrics(State(state): State<AppState>) -> Result<Response> {
    let count = state.items.count().await?;
    state.metrics.set_item_count(count);

    let body = state.metrics.render()?;
    Ok(([(CONTENT_TYPE, state.metrics.content_type())], body).into_response())
}
