//! HTTP handlers.

pub mod orders;
pub mod uploads;
