//! Caller extractor.

use crate::error::auth_error;
use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use campus_auth::Caller;
use campus_auth::providers::IdentityProvider;
use campus_web::{AppError, BearerToken};
use std::sync::Arc;

/// The authenticated caller of a request.
///
/// Reads the bearer token and resolves it through the state's
/// [`IdentityProvider`]. Rejects with 401 for missing or invalid tokens and
/// 502 when the provider cannot be reached.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller(pub Caller);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedCaller
where
    S: Send + Sync,
    Arc<dyn IdentityProvider>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let identity = Arc::<dyn IdentityProvider>::from_ref(state);
        let caller = identity.authenticate(&token).await.map_err(auth_error)?;

        tracing::debug!(user_id = %caller.user_id, role = %caller.role, "Caller authenticated");
        Ok(Self(caller))
    }
}
