//! Auth providers.
//!
//! This module defines traits for every external dependency of the auth
//! layer. Services depend on these traits; the server wires concrete
//! implementations from [`crate::stores`] and tests wire [`crate::mocks`].
//!
//! ```text
//! ┌────────────────────┐      ┌─────────────────────────────┐
//! │ IdentityProvider   │─────►│ BaaS auth API (/auth/v1/user)│
//! │                    │      └─────────────────────────────┘
//! │   uses ▼           │
//! │ ProfileDirectory   │─────► profiles / subscriptions tables
//! └────────────────────┘
//! ┌────────────────────┐
//! │ RateLimiter        │─────► rate_limits table or Redis
//! └────────────────────┘
//! ```
//!
//! The traits are object safe (`async_trait`) so the server can hold them
//! as `Arc<dyn ...>` and swap implementations without generic plumbing.

pub mod identity;
pub mod profile;
pub mod rate_limiter;

// Re-export provider traits
pub use identity::IdentityProvider;
pub use profile::ProfileDirectory;
pub use rate_limiter::{FixedWindow, RateLimitPolicy, RateLimitStatus, RateLimiter, WindowState};
