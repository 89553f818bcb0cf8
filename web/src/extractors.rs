//! Request extractors shared by the HTTP handlers.
//!
//! | Extractor | Source | Rejection |
//! |---|---|---|
//! | [`CorrelationId`] | middleware extension, then `X-Correlation-ID` | never |
//! | [`ClientIp`] | `X-Forwarded-For`, `X-Real-IP`, peer address | never |
//! | [`BearerToken`] | `Authorization: Bearer <token>` | 401 |
//!
//! ```ignore
//! use campus_web::{BearerToken, ClientIp, CorrelationId};
//!
//! async fn handler(
//!     CorrelationId(request_id): CorrelationId,
//!     ClientIp(ip): ClientIp,
//!     BearerToken(token): BearerToken,
//! ) -> Result<Json<Response>, AppError> {
//!     tracing::info!(%request_id, %ip, "Checkout requested");
//!     // resolve `token` through an identity provider ...
//! }
//! ```

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;

/// Correlation ID of the current request.
///
/// Uses the ID assigned by [`crate::middleware::correlation_id_layer`] when
/// the layer is installed, so the handler logs the same ID the client gets
/// back. Without the layer it parses the header or generates a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(|| header_uuid(&parts.headers))
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(id))
    }
}

fn header_uuid(headers: &HeaderMap) -> Option<Uuid> {
    let raw = headers.get(CORRELATION_ID_HEADER)?.to_str().ok()?;
    Uuid::parse_str(raw.trim()).ok()
}

/// Address of the client that sent the request.
///
/// Proxy headers win over the socket peer: first entry of
/// `X-Forwarded-For`, then `X-Real-IP`, then `ConnectInfo` (only present
/// when the app is served with `into_make_service_with_connect_info`).
/// Loopback if none is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = forwarded_for(&parts.headers)
            .or_else(|| real_ip(&parts.headers))
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        Ok(Self(ip))
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("X-Forwarded-For")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers.get("X-Real-IP")?.to_str().ok()?.trim().parse().ok()
}

/// Access token from `Authorization: Bearer <token>`.
///
/// Rejects with `401 Unauthorized` when the header is missing, uses another
/// scheme, or carries an empty token.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .trim();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}
