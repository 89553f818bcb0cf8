//! Axum web integration for the Campus platform services.
//!
//! This crate holds the HTTP plumbing every service shares, so the domain
//! crates (`campus-commerce`, `campus-media`) never touch Axum directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         HTTP Shell (Axum)               │  ← JSON, multipart, headers
//! │  - Request parsing / extractors         │  ← Correlation IDs, bearer tokens
//! │  - AppError → JSON error responses      │  ← Logging
//! ├─────────────────────────────────────────┤
//! │         Domain services                 │
//! │  - Order placement, upload brokering    │  ← Provider traits, mockable
//! │  - Rate limiting                        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from request (JSON, multipart, bearer token)
//! 3. **Call the domain service** with typed input
//! 4. **Map the result** (or domain error) to an HTTP response
//!
//! # Example
//!
//! ```ignore
//! use campus_web::{AppError, BearerToken};
//! use axum::{Router, routing::post, Json};
//!
//! async fn handle(
//!     token: BearerToken,
//!     Json(request): Json<PlaceOrderRequest>,
//! ) -> Result<Json<OrderResponse>, AppError> {
//!     let caller = identity.authenticate(&token.0).await?;
//!     Ok(Json(orders.place_order(&caller, request).await?.into()))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{BearerToken, ClientIp, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
