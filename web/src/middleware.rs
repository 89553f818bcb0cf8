//! Axum middleware for request tracking.
//!
//! `correlation_id_layer()` gives every request an ID that follows it
//! through the logs:
//!
//! 1. **Read** `X-Correlation-ID` from the request, or generate a UUID v4
//! 2. **Store** it in request extensions (see [`CorrelationIdExt`])
//! 3. **Run** the inner service inside an `http_request` tracing span
//! 4. **Echo** the ID back in the response `X-Correlation-ID` header
//!
//! The order compensation path logs inside this span, so a failed checkout
//! can be traced end to end from the ID the client received.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use campus_web::middleware::correlation_id_layer;
//!
//! let app = Router::new()
//!     .route("/api/orders/validate", post(validate_order))
//!     .layer(correlation_id_layer());
//! ```

use axum::{extract::Request, http::HeaderValue, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create the correlation ID layer.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation ID tracking.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdService { inner }
    }
}

/// Service produced by [`CorrelationIdLayer`].
#[derive(Clone, Debug)]
pub struct CorrelationIdService<S> {
    inner: S,
}

fn incoming_correlation_id(req: &Request) -> Option<Uuid> {
    req.headers()
        .get(CORRELATION_ID_HEADER)?
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
}

impl<S> Service<Request> for CorrelationIdService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = incoming_correlation_id(&req).unwrap_or_else(Uuid::new_v4);
        req.extensions_mut().insert(correlation_id);

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = fut.await?;
                if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
                    response.headers_mut().insert(CORRELATION_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}

/// Read the correlation ID stored by the middleware.
pub trait CorrelationIdExt {
    /// Correlation ID of this request, `None` if the layer is not installed.
    fn correlation_id(&self) -> Option<Uuid>;
}

impl CorrelationIdExt for Request {
    fn correlation_id(&self) -> Option<Uuid> {
        self.extensions().get::<Uuid>().copied()
    }
}
