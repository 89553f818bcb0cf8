//! Mock provider implementations for testing.
//!
//! `MockCatalog` and `MockOrderRepository` share one inventory, so stock
//! reserved through the repository is visible through the catalog.

pub mod catalog;
pub mod repository;

pub use catalog::MockCatalog;
pub use repository::{FailPoint, MockOrderRepository, StoredOrder};
