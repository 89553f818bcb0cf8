//! # Campus Commerce
//!
//! Server-side order validation for the shop and event ticketing.
//!
//! The browser sends a cart; this crate decides what it actually costs and
//! whether it can be sold:
//!
//! 1. [`validation`] checks the cart and shipping details, merging duplicate lines
//! 2. [`catalog`] re-reads every item's price and availability
//! 3. [`pricing`] applies the member tier and the shipping fee
//! 4. [`service::OrderService`] persists the order and reserves stock, undoing
//!    its own writes if a later step fails
//!
//! ## Example
//!
//! ```rust
//! use campus_commerce::types::{CartItem, PlaceOrderRequest};
//! use campus_commerce::validation::validate_order;
//! use campus_core::TicketTypeId;
//!
//! let request = PlaceOrderRequest {
//!     items: vec![CartItem::ticket(TicketTypeId::new(), 2)],
//!     shipping: None,
//! };
//! let order = validate_order(&request).unwrap();
//! assert_eq!(order.lines[0].quantity, 2);
//! ```

pub mod catalog;
pub mod error;
pub mod pricing;
pub mod repository;
pub mod service;
pub mod stores;
pub mod types;
pub mod validation;

/// Mock implementations for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use catalog::{Catalog, ProductRecord, TicketTypeRecord};
pub use error::{CommerceError, FieldError, Result};
pub use pricing::PricingPolicy;
pub use repository::OrderRepository;
pub use service::OrderService;
pub use types::{PlaceOrderRequest, PlacedOrder};
