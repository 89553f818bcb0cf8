//! # Campus Auth
//!
//! Who is calling, what they may do, and how often they may do it.
//!
//! ## Features
//!
//! - **Identity**: bearer tokens verified against the BaaS auth endpoint
//! - **Roles**: `student`, `professor` and `admin`, read from the caller's profile
//! - **Membership**: active subscription lookup for member pricing
//! - **Rate limiting**: fixed-window limiter with atomic `PostgreSQL` and `Redis` stores
//!
//! ## Architecture
//!
//! Every external dependency sits behind an object-safe provider trait:
//!
//! ```text
//! providers (traits) ──► stores (PostgreSQL, Redis, HTTP)
//!                    └─► mocks  (in-memory, clock-injected)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use campus_auth::mocks::MockRateLimiter;
//! use campus_auth::providers::{RateLimitPolicy, RateLimiter};
//! use std::time::Duration;
//!
//! # async fn example() -> campus_auth::Result<()> {
//! let limiter = MockRateLimiter::new();
//! let policy = RateLimitPolicy::new(10, Duration::from_secs(60));
//! let status = limiter.check_and_record("validate-order:u1", policy).await?;
//! assert_eq!(status.remaining, 9);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod caller;
pub mod error;
pub mod providers;
pub mod stores;

/// Mock implementations for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use caller::Caller;
pub use error::{AuthError, Result};
