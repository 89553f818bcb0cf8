//! HTTP request handlers.
//!
//! Handlers shared by every service binary. Domain handlers live in the
//! server crate.

pub mod health;

// Re-export common handler utilities
pub use health::{ComponentHealth, ReadinessReport, health_check, readiness_response};
