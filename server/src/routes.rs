//! Router configuration for the Campus server.

use crate::api::{orders, uploads};
use crate::state::AppState;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use campus_auth::providers::RateLimitPolicy;
use campus_web::handlers::{ComponentHealth, ReadinessReport, health_check, readiness_response};
use campus_web::middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and the title field on top of the file.
const UPLOAD_BODY_OVERHEAD: usize = 1024 * 1024;

/// Key read by the readiness probe. Never written.
const READINESS_PROBE_KEY: &str = "readiness-probe";

/// Build the complete Axum router.
///
/// - `GET /health` liveness
/// - `GET /ready` readiness (rate limit store reachable)
/// - `POST /api/orders/validate`
/// - `POST /api/videos/upload`, body limit = max upload size + 1 MiB
///
/// CORS is applied separately by [`cors_layer`].
pub fn build_router(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.uploads.limits().max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(UPLOAD_BODY_OVERHEAD);

    let api_routes = Router::new()
        .route("/orders/validate", post(orders::validate_order))
        .route(
            "/videos/upload",
            post(uploads::upload_video).layer(DefaultBodyLimit::max(upload_limit)),
        );

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}

/// CORS for browser clients. An empty origin list allows any origin.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let correlation = HeaderName::from_static("x-correlation-id");
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, correlation.clone()])
        .expose_headers([RETRY_AFTER, correlation])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Readiness: the rate limit store answers a read.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    let probe = RateLimitPolicy::new(1, Duration::from_secs(1));
    let component = match state.rate_limiter.get_attempts(READINESS_PROBE_KEY, probe).await {
        Ok(_) => ComponentHealth::up("rate_limiter"),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness probe failed");
            ComponentHealth::down("rate_limiter", err.to_string())
        }
    };

    readiness_response(vec![component])
}
