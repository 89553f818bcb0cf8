//! Order persistence provider.

use crate::error::Result;
use crate::types::{AttendeePlaceholder, NewOrder, PricedLine};
use async_trait::async_trait;
use campus_core::{OrderId, ProductId, TicketTypeId};

/// Writes orders and moves stock.
///
/// The individual calls are not wrapped in one transaction; callers undo
/// partial work with the `release_*` and `delete_order` operations.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert the order header and return its id.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Persistence` on failure.
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId>;

    /// Insert the order's line items.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Persistence` on failure.
    async fn insert_line_items(&self, order_id: OrderId, lines: &[PricedLine]) -> Result<()>;

    /// Atomically take `quantity` units of product stock.
    ///
    /// Returns `false` when not enough stock remains.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Persistence` on failure.
    async fn reserve_product_stock(&self, product_id: ProductId, quantity: u32) -> Result<bool>;

    /// Atomically take `quantity` tickets.
    ///
    /// Returns `false` when not enough tickets remain.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Persistence` on failure.
    async fn reserve_tickets(&self, ticket_type_id: TicketTypeId, quantity: u32) -> Result<bool>;

    /// Give back previously reserved product stock.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Persistence` on failure.
    async fn release_product_stock(&self, product_id: ProductId, quantity: u32) -> Result<()>;

    /// Give back previously reserved tickets.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Persistence` on failure.
    async fn release_tickets(&self, ticket_type_id: TicketTypeId, quantity: u32) -> Result<()>;

    /// Create pending, unnamed attendee rows for the order.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Persistence` on failure.
    async fn create_attendee_placeholders(
        &self,
        order_id: OrderId,
        attendees: &[AttendeePlaceholder],
    ) -> Result<()>;

    /// Delete the order and everything hanging off it.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Persistence` on failure.
    async fn delete_order(&self, order_id: OrderId) -> Result<()>;
}
