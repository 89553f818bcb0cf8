//! Application state shared by all HTTP handlers.

use axum::extract::FromRef;
use campus_auth::providers::{IdentityProvider, RateLimitPolicy, RateLimiter};
use campus_commerce::OrderService;
use campus_media::UploadBroker;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is an `Arc` or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Resolves bearer tokens into callers
    pub identity: Arc<dyn IdentityProvider>,

    /// Per-user request limits
    pub rate_limiter: Arc<dyn RateLimiter>,

    /// Order placement
    pub orders: OrderService,

    /// Course video uploads
    pub uploads: UploadBroker,

    /// Limit applied to order validation
    pub order_rate_limit: RateLimitPolicy,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        rate_limiter: Arc<dyn RateLimiter>,
        orders: OrderService,
        uploads: UploadBroker,
        order_rate_limit: RateLimitPolicy,
    ) -> Self {
        Self {
            identity,
            rate_limiter,
            orders,
            uploads,
            order_rate_limit,
        }
    }
}

// Lets the caller extractor pull the identity provider out of the state
impl FromRef<AppState> for Arc<dyn IdentityProvider> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.identity.clone()
    }
}
