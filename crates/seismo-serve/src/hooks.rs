//! Middleware hooks wrapped around every route.
//!
//! The router applies them in a fixed order, outermost first:
//!
//! 1. [`log_request`] - records endpoint template, method, status, latency
//! 2. [`add_cache_headers`] - `Cache-Control` on successful GET responses

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;

/// Cache policy for successful reads.
const CACHE_CONTROL_VALUE: &str = "public, max-age=60, stale-while-revalidate=300";

/// Endpoint label for requests that matched no route.
const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Log and count every request by its route template.
///
/// Requests that hit the fallback share one label so arbitrary paths
/// cannot grow the metric label set.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let endpoint = endpoint_label(&request);

    let started = Instant::now();
    let response = next.run(request).await;
    let latency = started.elapsed();
    let status = response.status().as_u16();

    tracing::info!(
        method = %method,
        endpoint = %endpoint,
        status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    metrics::counter!(
        "http_requests_total",
        "endpoint" => endpoint.clone(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "endpoint" => endpoint)
        .record(latency.as_secs_f64());

    response
}

fn endpoint_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_owned())
}

/// Add cache headers to successful GET responses.
pub async fn add_cache_headers(request: Request, next: Next) -> Response {
    let cacheable = request.method() == Method::GET;
    let mut response = next.run(request).await;

    if cacheable && response.status().is_success() {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_VALUE),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_request_without_matched_path_is_unmatched() {
        let request = axum::http::Request::builder()
            .uri("/no/such/route")
            .body(Body::empty())
            .unwrap();
        assert_eq!(endpoint_label(&request), UNMATCHED_ENDPOINT);
    }
}
