//! Storage-backed provider implementations.

pub mod postgres;

pub use postgres::{PostgresCatalog, PostgresOrderRepository};
