use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{Instrument, info, info_span};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Caller's id when present and non-blank, a fresh `req-<nanos>` otherwise.
fn incoming_or_new(req: &Request<Body>) -> String {
    if let Some(v) = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return v.to_string();
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    format!("req-{nanos}")
}

/// Echoes or assigns `X-Request-Id` and logs one line per request.
pub async fn request_id(req: Request<Body>, next: Next) -> Response {
    let id = incoming_or_new(&req);
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let span = info_span!("request", request_id = %id, %method, %path);
    let mut res = next.run(req).instrument(span.clone()).await;

    if let Ok(v) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, v);
    }
    span.in_scope(|| {
        info!(
            status = res.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request completed"
        )
    });
    res
}
