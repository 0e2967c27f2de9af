//! HTTP-level middleware (cross-cutting concerns).
//!
//! This module is for transport/infrastructure concerns that should apply to
//! most (or all) routes, regardless of API version.
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Access logging / request tracing (TraceLayer)
//! - Body size limits
//! - Global timeouts, exposed to handlers as a `RequestDeadline`

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::extract::Request;
use axum::http::{StatusCode, header::HeaderName};
use axum::middleware::{self, Next};
use axum::response::Response;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::oauth::RequestDeadline;

/// Apply HTTP-level middleware to the given Router.
///
/// Defaults (see `Config`):
/// - Request-Id header: `x-request-id`
/// - Body limit: 1 MiB
/// - Timeout: 30 seconds
pub fn apply(router: Router, config: &Config) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    let request_timeout = config.request_timeout;

    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        // Generate a request id if missing, then propagate it to the response.
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(RequestBodyLimitLayer::new(config.request_body_limit_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        // Access log / tracing for all requests.
        .layer(TraceLayer::new_for_http());

    router
        // Innermost: the same budget as TimeoutLayer, so outbound calls can stop early.
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            stamp_deadline(request_timeout, req, next)
        }))
        .layer(layers)
}

async fn stamp_deadline(budget: Duration, mut req: Request, next: Next) -> Response {
    if let Some(deadline) = tokio::time::Instant::now().checked_add(budget) {
        req.extensions_mut().insert(RequestDeadline(deadline));
    }
    next.run(req).await
}
