//! Router assembly and HTTP server

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::{Error, Result};
use crate::handlers::{self, health, items, metrics};
use crate::metrics::Metrics;
use crate::repository::ItemRepository;

/// Route label for requests that matched no route
const UNMATCHED_ROUTE: &str = "unmatched";

/// Shared state for handlers
#[derive(Clone)]
pub struct AppState {
    /// Item persistence
    pub items: ItemRepository,
    /// Request and item metrics
    pub metrics: Metrics,
    /// Process start, reported as uptime
    pub started_at: Instant,
}

impl AppState {
    /// State with fresh metrics, starting the uptime clock now
    pub fn new(items: ItemRepository) -> Result<Self> {
        Ok(Self {
            items,
            metrics: Metrics::new()?,
            started_at: Instant::now(),
        })
    }
}

/// Build the todo API router
///
/// Routes:
/// - `GET /` - service descriptor
/// - `GET /healthz` - liveness (store PING)
/// - `GET /metrics` - Prometheus metrics
/// - `GET|POST /api/items`
/// - `GET|PUT|DELETE /api/items/{id}`
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::service_info))
        .route("/healthz", get(health::healthz))
        .route("/metrics", get(metrics::metrics))
        .route(
            "/api/items",
            get(items::list_items).post(items::create_item),
        )
        .route(
            "/api/items/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .with_state(state)
}

/// Counts, times and logs every request, labelled by route template
async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    state
        .metrics
        .observe_request(&method, &route, status, elapsed);
    info!(
        method = %method,
        route = %route,
        status,
        latency_ms = elapsed.as_millis() as u64,
        "request completed"
    );

    response
}

/// Serve until SIGINT/SIGTERM, then drain in-flight requests
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("failed to bind {}: {}", addr, e)))?;

    info!(addr = %addr, "starting todo api");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("server error: {}", e)))?;

    info!("todo api stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}
