use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::state::AppState;

pub struct Metrics {
    pub registry: Registry,
    pub http_requests: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests by route and status"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests.clone()))?;
        Ok(Self {
            registry,
            http_requests,
        })
    }
}

pub async fn track_http(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    // Matched route pattern, not the raw path, to keep cardinality bounded.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    state
        .metrics
        .http_requests
        .with_label_values(&[&method, &path, response.status().as_str()])
        .inc();
    response
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(err) = encoder.encode(&state.metrics.registry.gather(), &mut buffer) {
        tracing::error!(error = %err, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (
        [(axum::http::header::CONTENT_TYPE, encoder.format_type())],
        buffer,
    )
        .into_response()
}
