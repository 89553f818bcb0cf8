//! Request, order and line types.

use campus_core::{DateTime, EventId, Money, OrderId, ProductId, TicketTypeId, UserId, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Request
// ============================================================================

/// One cart line as sent by the client.
///
/// Exactly one of `product_id` / `event_ticket_type_id` must be set. Prices
/// are never accepted from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Shop product
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Event ticket type
    #[serde(default)]
    pub event_ticket_type_id: Option<TicketTypeId>,
    /// Requested quantity (signed so negative input reaches validation)
    pub quantity: i64,
}

impl CartItem {
    /// A product line.
    #[must_use]
    pub const fn product(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id: Some(product_id),
            event_ticket_type_id: None,
            quantity,
        }
    }

    /// A ticket line.
    #[must_use]
    pub const fn ticket(ticket_type_id: TicketTypeId, quantity: i64) -> Self {
        Self {
            product_id: None,
            event_ticket_type_id: Some(ticket_type_id),
            quantity,
        }
    }
}

/// Delivery details. Missing fields deserialize as empty and are reported by
/// validation rather than by the JSON parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingInfo {
    /// Recipient name
    pub full_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Street address
    pub address_line1: String,
    /// Apartment, suite, etc.
    pub address_line2: Option<String>,
    /// City
    pub city: String,
    /// Postal code
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

/// Body of `POST /api/orders/validate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    /// Cart lines
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Delivery details, required when the cart contains products
    #[serde(default)]
    pub shipping: Option<ShippingInfo>,
}

// ============================================================================
// Validated order
// ============================================================================

/// What a line buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LineTarget {
    /// Shop product
    Product(ProductId),
    /// Event ticket type
    Ticket(TicketTypeId),
}

impl LineTarget {
    /// Whether this is a shop product.
    #[must_use]
    pub const fn is_product(&self) -> bool {
        matches!(self, Self::Product(_))
    }
}

impl fmt::Display for LineTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product(id) => write!(f, "product {id}"),
            Self::Ticket(id) => write!(f, "ticket type {id}"),
        }
    }
}

/// A validated, merged cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    /// What is bought
    pub target: LineTarget,
    /// How many (1..=`MAX_QUANTITY_PER_LINE`)
    pub quantity: u32,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    /// Merged lines in first-seen order
    pub lines: Vec<OrderLine>,
    /// Trimmed shipping details
    pub shipping: Option<ShippingInfo>,
}

impl ValidatedOrder {
    /// Whether any line is a shop product.
    #[must_use]
    pub fn has_products(&self) -> bool {
        self.lines.iter().any(|line| line.target.is_product())
    }
}

// ============================================================================
// Priced and persisted order
// ============================================================================

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting payment
    Pending,
}

impl OrderStatus {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line with its authoritative price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    /// What is bought
    pub target: LineTarget,
    /// Catalog name at the time of ordering
    pub name: String,
    /// Quantity
    pub quantity: u32,
    /// Unit price charged
    pub unit_price: Money,
    /// `unit_price * quantity`
    pub line_total: Money,
    /// Whether the member tier was applied
    pub member_price_applied: bool,
}

/// Order header to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Buyer
    pub user_id: UserId,
    /// Initial status
    pub status: OrderStatus,
    /// ISO 4217 currency code
    pub currency: String,
    /// Sum of line totals
    pub subtotal: Money,
    /// Flat shipping fee (zero for ticket-only orders)
    pub shipping: Money,
    /// `subtotal + shipping`
    pub total: Money,
    /// Delivery details
    pub shipping_info: Option<ShippingInfo>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// One attendee row to create per ticket unit; the name is filled in later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendeePlaceholder {
    /// Event the ticket admits to
    pub event_id: EventId,
    /// Ticket type bought
    pub ticket_type_id: TicketTypeId,
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
    /// New order id
    pub order_id: OrderId,
    /// Status (always `pending`)
    pub status: OrderStatus,
    /// Currency code
    pub currency: String,
    /// Sum of line totals
    pub subtotal: Money,
    /// Shipping fee
    pub shipping: Money,
    /// Amount due
    pub total: Money,
    /// Priced lines
    pub lines: Vec<PricedLine>,
}
