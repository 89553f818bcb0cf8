//! # Campus Server
//!
//! HTTP surface for the privileged operations the browser cannot perform
//! itself:
//!
//! - `POST /api/orders/validate`: re-price a cart from the catalog, reserve
//!   stock and create a pending order (rate limited per user)
//! - `POST /api/videos/upload`: forward a professor's course video to the
//!   video platform with signed playback
//!
//! The binary in `main.rs` wires the `PostgreSQL`, Redis, identity and video
//! backends into an [`AppState`]; tests build the same router over the
//! in-memory mocks.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use auth::AuthenticatedCaller;
pub use config::Config;
pub use routes::{build_router, cors_layer};
pub use state::AppState;
