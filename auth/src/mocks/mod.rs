//! Mock provider implementations for testing.
//!
//! Simple in-memory implementations of every auth provider trait, for use in
//! unit and integration tests across the workspace.

pub mod identity;
pub mod profile;
pub mod rate_limiter;

pub use identity::MockIdentityProvider;
pub use profile::MockProfileDirectory;
pub use rate_limiter::MockRateLimiter;
