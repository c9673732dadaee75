//! Liveness endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthStatus {
    status: &'static str,
    timestamp: String,
    uptime_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// `GET /healthz` - healthy only if the store answers a PING
pub async fn healthz(State(state): State<AppState>) -> Response {
    let timestamp = Utc::now().to_rfc3339();
    let uptime_seconds = state.started_at.elapsed().as_secs_f64();

    match state.items.ping().await {
        Ok(()) => Json(HealthStatus {
            status: "healthy",
            timestamp,
            uptime_seconds,
            error: None,
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus {
                    status: "unhealthy",
                    timestamp,
                    uptime_seconds,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}
