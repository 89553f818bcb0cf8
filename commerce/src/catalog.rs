//! Catalog provider and availability rules.

use crate::error::{CommerceError, Result};
use crate::types::LineTarget;
use async_trait::async_trait;
use campus_core::{DateTime, EventId, Money, ProductId, TicketTypeId, Utc};

/// Shop product as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    /// Product id
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Standard price
    pub price: Money,
    /// Member price, if the product has one
    pub member_price: Option<Money>,
    /// Units in stock
    pub stock: u32,
    /// Whether the product is for sale
    pub is_active: bool,
}

/// Event ticket type as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTypeRecord {
    /// Ticket type id
    pub id: TicketTypeId,
    /// Event the ticket admits to
    pub event_id: EventId,
    /// Display name
    pub name: String,
    /// Standard price
    pub price: Money,
    /// Member price, if any
    pub member_price: Option<Money>,
    /// Tickets left
    pub available: u32,
    /// Whether the ticket type is on sale
    pub is_active: bool,
    /// End of ticket sales, if limited
    pub sales_end: Option<DateTime<Utc>>,
    /// Event start time
    pub event_starts_at: DateTime<Utc>,
}

/// Read access to authoritative prices and stock.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up a product.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Catalog` if the lookup fails.
    async fn product(&self, id: ProductId) -> Result<Option<ProductRecord>>;

    /// Look up a ticket type together with its event's start time.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Catalog` if the lookup fails.
    async fn ticket_type(&self, id: TicketTypeId) -> Result<Option<TicketTypeRecord>>;
}

/// A line resolved against the catalog and checked for availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// What is bought
    pub target: LineTarget,
    /// Catalog name
    pub name: String,
    /// Standard price
    pub price: Money,
    /// Member price, if any
    pub member_price: Option<Money>,
    /// Event, for ticket lines
    pub event_id: Option<EventId>,
}

/// Check that `quantity` units of a product can be sold.
///
/// # Errors
///
/// - `CommerceError::Unavailable` - missing or inactive
/// - `CommerceError::OutOfStock` - `stock < quantity`
pub fn check_product(
    id: ProductId,
    record: Option<ProductRecord>,
    quantity: u32,
) -> Result<CatalogEntry> {
    let target = LineTarget::Product(id);

    let record = record.ok_or_else(|| unavailable(target, "not found"))?;
    if !record.is_active {
        return Err(unavailable(target, "no longer for sale"));
    }
    if record.stock < quantity {
        return Err(CommerceError::OutOfStock {
            item: target.to_string(),
            requested: quantity,
            available: record.stock,
        });
    }

    Ok(CatalogEntry {
        target,
        name: record.name,
        price: record.price,
        member_price: record.member_price,
        event_id: None,
    })
}

/// Check that `quantity` tickets can be sold at `now`.
///
/// # Errors
///
/// - `CommerceError::Unavailable` - missing, inactive, sales ended or event started
/// - `CommerceError::OutOfStock` - `available < quantity`
pub fn check_ticket_type(
    id: TicketTypeId,
    record: Option<TicketTypeRecord>,
    quantity: u32,
    now: DateTime<Utc>,
) -> Result<CatalogEntry> {
    let target = LineTarget::Ticket(id);

    let record = record.ok_or_else(|| unavailable(target, "not found"))?;
    if !record.is_active {
        return Err(unavailable(target, "not on sale"));
    }
    if record.sales_end.is_some_and(|end| end <= now) {
        return Err(unavailable(target, "ticket sales have ended"));
    }
    if record.event_starts_at <= now {
        return Err(unavailable(target, "the event has already started"));
    }
    if record.available < quantity {
        return Err(CommerceError::OutOfStock {
            item: target.to_string(),
            requested: quantity,
            available: record.available,
        });
    }

    Ok(CatalogEntry {
        target,
        name: record.name,
        price: record.price,
        member_price: record.member_price,
        event_id: Some(record.event_id),
    })
}

fn unavailable(target: LineTarget, reason: &str) -> CommerceError {
    CommerceError::Unavailable {
        item: target.to_string(),
        reason: reason.to_string(),
    }
}
