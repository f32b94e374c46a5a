use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use crate::core::error::with_trace_id;
use std::time::Instant;
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// HTTP header name for trace ID
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// Middleware that tags every request with a trace ID.
///
/// A UUID supplied by the client in `X-Trace-Id` is reused so calls can be
/// correlated across services; otherwise a fresh v4 UUID is generated. The ID
/// is stored in the request extensions, attached to the `http_request` span,
/// stamped on JSON error bodies and echoed back in the response headers.
pub async fn trace_id_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| Uuid::parse_str(h).ok())
        .unwrap_or_else(Uuid::new_v4)
        .to_string();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
    );

    tracing::info!(parent: &span, "Request started");

    request.extensions_mut().insert(TraceId(trace_id.clone()));
    let trace_id_for_errors = trace_id.clone();

    let started = Instant::now();
    let response = async move {
        let response = with_trace_id(trace_id_for_errors, next.run(request)).await;

        tracing::info!(
            status = %response.status(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );

        response
    }
    .instrument(span)
    .await;

    let (mut parts, body) = response.into_parts();
    parts.headers.insert(
        TRACE_ID_HEADER,
        HeaderValue::from_str(&trace_id).unwrap_or_else(|_| HeaderValue::from_static("invalid")),
    );

    Response::from_parts(parts, body)
}

/// Extension type for storing trace ID in request extensions
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
