//! HTTP handlers

pub mod health;
pub mod items;
pub mod metrics;

use axum::extract::Request;
use axum::Json;
use serde_json::{json, Value};

use crate::error::Error;

/// `GET /` - service descriptor
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "name": "todo-api",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/healthz",
            "metrics": "/metrics",
            "items": "/api/items",
        },
    }))
}

/// Fallback for unmatched routes
pub async fn not_found(req: Request) -> Error {
    Error::NotFound(format!("no route for {} {}", req.method(), req.uri().path()))
}
