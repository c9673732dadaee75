//! Prometheus metrics for the todo API
//!
//! Provides:
//! - `http_requests_total{method,route,status}`
//! - `http_request_duration_seconds{method,route,status}`
//! - `todo_items_total`, refreshed from a key scan on every scrape
//!
//! Collectors live in a per-process `Registry` rather than the prometheus
//! default registry, so independent routers (one per test) never collide.

use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::error::{Error, Result};

const LABELS: &[&str] = &["method", "route", "status"];

/// Metric collectors shared by all handlers
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    request_duration: HistogramVec,
    items: IntGauge,
}

impl Metrics {
    /// Build and register all collectors
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            LABELS,
        )
        .map_err(metrics_error)?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of HTTP requests in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            LABELS,
        )
        .map_err(metrics_error)?;

        let items = IntGauge::new("todo_items_total", "Current number of stored items")
            .map_err(metrics_error)?;

        registry
            .register(Box::new(requests.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(request_duration.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(items.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            requests,
            request_duration,
            items,
        })
    }

    /// Record one completed request
    pub fn observe_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        let labels = [method, route, status.as_str()];
        self.requests.with_label_values(&labels).inc();
        self.request_duration
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
    }

    /// Set the item count gauge
    pub fn set_item_count(&self, count: usize) {
        self.items.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Render all collectors in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| Error::Internal(e.to_string()))
    }

    /// Content type of [`Metrics::render`] output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

fn metrics_error(e: prometheus::Error) -> Error {
    Error::Internal(format!("metrics: {}", e))
}
