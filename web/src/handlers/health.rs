//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Health of one dependency (database, rate-limit backend, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentHealth {
    /// Component name
    pub component: String,
    /// Whether the component answered
    pub healthy: bool,
    /// Failure description when unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    /// A component that answered.
    #[must_use]
    pub fn up(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            healthy: true,
            message: None,
        }
    }

    /// A component that failed its check.
    #[must_use]
    pub fn down(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            healthy: false,
            message: Some(message.into()),
        }
    }
}

/// Readiness response body.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    /// True when every component is healthy
    pub ready: bool,
    /// Individual component results
    pub components: Vec<ComponentHealth>,
}

/// Build a readiness response from dependency checks.
///
/// # Status Codes
///
/// - 200 OK: every component healthy
/// - 503 Service Unavailable: at least one component down
#[must_use]
pub fn readiness_response(components: Vec<ComponentHealth>) -> (StatusCode, Json<ReadinessReport>) {
    let ready = components.iter().all(|c| c.healthy);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessReport { ready, components }))
}
