//! Order placement workflow.
//!
//! ```text
//! validate ─► membership ─► catalog checks ─► price ─► create order
//!                                                          │
//!        ┌─────────────────────────────────────────────────┘
//!        ▼
//!   line items ─► reserve stock (per line) ─► attendee placeholders
//!        │                 │                          │
//!        └──── on failure: release reservations (reverse), delete order
//! ```

use crate::catalog::{Catalog, CatalogEntry, check_product, check_ticket_type};
use crate::error::{CommerceError, Result};
use crate::pricing::{self, PricingPolicy, Quote};
use crate::repository::OrderRepository;
use crate::types::{
    AttendeePlaceholder, LineTarget, NewOrder, OrderLine, OrderStatus, PlaceOrderRequest,
    PlacedOrder, ValidatedOrder,
};
use crate::validation::validate_order;
use campus_auth::Caller;
use campus_auth::providers::ProfileDirectory;
use campus_core::OrderId;
use campus_core::environment::Clock;
use std::sync::Arc;

/// Places orders against the catalog and order repository.
#[derive(Clone)]
pub struct OrderService {
    catalog: Arc<dyn Catalog>,
    orders: Arc<dyn OrderRepository>,
    profiles: Arc<dyn ProfileDirectory>,
    clock: Arc<dyn Clock>,
    pricing: PricingPolicy,
}

impl OrderService {
    /// Create a service.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        orders: Arc<dyn OrderRepository>,
        profiles: Arc<dyn ProfileDirectory>,
        clock: Arc<dyn Clock>,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            catalog,
            orders,
            profiles,
            clock,
            pricing,
        }
    }

    /// Pricing settings in use.
    #[must_use]
    pub const fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    /// Validate, price and persist an order for `caller`.
    ///
    /// Client-side prices are never trusted: every line is re-read from the
    /// catalog. If anything fails after the order row exists, reservations
    /// already taken are released and the order is deleted.
    ///
    /// # Errors
    ///
    /// - `CommerceError::Validation` - malformed request
    /// - `CommerceError::Unavailable` / `CommerceError::OutOfStock` - item cannot be sold
    /// - `CommerceError::Catalog` / `Membership` / `Persistence` - backend failure
    pub async fn place_order(
        &self,
        caller: &Caller,
        request: &PlaceOrderRequest,
    ) -> Result<PlacedOrder> {
        let result = self.try_place_order(caller, request).await;

        match &result {
            Ok(placed) => {
                metrics::counter!("campus_orders_total", "outcome" => "placed").increment(1);
                tracing::info!(
                    order_id = %placed.order_id,
                    user_id = %caller.user_id,
                    total = %placed.total,
                    lines = placed.lines.len(),
                    "Order placed"
                );
            }
            Err(err) => {
                metrics::counter!("campus_orders_total", "outcome" => err.outcome()).increment(1);
                if err.is_user_error() {
                    tracing::info!(user_id = %caller.user_id, error = %err, "Order rejected");
                } else {
                    tracing::error!(user_id = %caller.user_id, error = %err, "Order placement failed");
                }
            }
        }

        result
    }

    async fn try_place_order(
        &self,
        caller: &Caller,
        request: &PlaceOrderRequest,
    ) -> Result<PlacedOrder> {
        let order = validate_order(request)?;
        let is_member = self.profiles.has_active_subscription(caller.user_id).await?;
        let entries = self.resolve_lines(&order).await?;
        let quote = pricing::quote(&entries, &self.pricing, is_member)?;

        let new_order = NewOrder {
            user_id: caller.user_id,
            status: OrderStatus::Pending,
            currency: self.pricing.currency.clone(),
            subtotal: quote.subtotal,
            shipping: quote.shipping,
            total: quote.total,
            shipping_info: order.shipping,
            created_at: self.clock.now(),
        };
        let order_id = self.orders.create_order(&new_order).await?;

        let mut reserved = Vec::new();
        if let Err(err) = self.fulfil(order_id, &quote, &entries, &mut reserved).await {
            self.compensate(order_id, &reserved).await;
            return Err(err);
        }

        Ok(PlacedOrder {
            order_id,
            status: new_order.status,
            currency: new_order.currency,
            subtotal: quote.subtotal,
            shipping: quote.shipping,
            total: quote.total,
            lines: quote.lines,
        })
    }

    async fn resolve_lines(&self, order: &ValidatedOrder) -> Result<Vec<(CatalogEntry, u32)>> {
        let now = self.clock.now();
        let mut entries = Vec::with_capacity(order.lines.len());

        for line in &order.lines {
            let entry = match line.target {
                LineTarget::Product(id) => {
                    check_product(id, self.catalog.product(id).await?, line.quantity)?
                }
                LineTarget::Ticket(id) => {
                    check_ticket_type(id, self.catalog.ticket_type(id).await?, line.quantity, now)?
                }
            };
            entries.push((entry, line.quantity));
        }

        Ok(entries)
    }

    /// Steps that run after the order row exists. Every successful
    /// reservation is pushed to `reserved` so it can be undone.
    async fn fulfil(
        &self,
        order_id: OrderId,
        quote: &Quote,
        entries: &[(CatalogEntry, u32)],
        reserved: &mut Vec<OrderLine>,
    ) -> Result<()> {
        self.orders.insert_line_items(order_id, &quote.lines).await?;

        for (entry, quantity) in entries {
            let taken = match entry.target {
                LineTarget::Product(id) => self.orders.reserve_product_stock(id, *quantity).await?,
                LineTarget::Ticket(id) => self.orders.reserve_tickets(id, *quantity).await?,
            };

            if !taken {
                return Err(CommerceError::SoldOutWhileReserving {
                    item: entry.target.to_string(),
                    requested: *quantity,
                });
            }

            reserved.push(OrderLine {
                target: entry.target,
                quantity: *quantity,
            });
        }

        let attendees: Vec<AttendeePlaceholder> = entries
            .iter()
            .filter_map(|(entry, quantity)| match (entry.target, entry.event_id) {
                (LineTarget::Ticket(ticket_type_id), Some(event_id)) => Some(
                    std::iter::repeat_n(
                        AttendeePlaceholder {
                            event_id,
                            ticket_type_id,
                        },
                        usize::try_from(*quantity).unwrap_or(0),
                    ),
                ),
                _ => None,
            })
            .flatten()
            .collect();

        if !attendees.is_empty() {
            self.orders
                .create_attendee_placeholders(order_id, &attendees)
                .await?;
        }

        Ok(())
    }

    /// Best effort: failures are logged and never replace the original error.
    async fn compensate(&self, order_id: OrderId, reserved: &[OrderLine]) {
        metrics::counter!("campus_order_compensations_total").increment(1);
        tracing::warn!(
            order_id = %order_id,
            reservations = reserved.len(),
            "Compensating failed order"
        );

        for line in reserved.iter().rev() {
            let released = match line.target {
                LineTarget::Product(id) => self.orders.release_product_stock(id, line.quantity).await,
                LineTarget::Ticket(id) => self.orders.release_tickets(id, line.quantity).await,
            };
            if let Err(err) = released {
                tracing::error!(
                    order_id = %order_id,
                    item = %line.target,
                    quantity = line.quantity,
                    error = %err,
                    "Failed to release reservation"
                );
            }
        }

        if let Err(err) = self.orders.delete_order(order_id).await {
            tracing::error!(order_id = %order_id, error = %err, "Failed to delete order");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::{ProductRecord, TicketTypeRecord};
    use crate::mocks::{FailPoint, MockCatalog, MockOrderRepository};
    use crate::types::{CartItem, ShippingInfo};
    use campus_auth::mocks::MockProfileDirectory;
    use campus_core::{EventId, Money, ProductId, Role, TicketTypeId, UserId};
    use campus_testing::test_clock;
    use chrono::Duration;

    struct Fixture {
        service: OrderService,
        catalog: MockCatalog,
        orders: MockOrderRepository,
        profiles: MockProfileDirectory,
        caller: Caller,
        hoodie: ProductId,
        ticket: TicketTypeId,
    }

    fn fixture() -> Fixture {
        let clock = test_clock();
        let now = clock.now();
        let catalog = MockCatalog::new();
        let hoodie = ProductId::new();
        let ticket = TicketTypeId::new();

        catalog.add_product(ProductRecord {
            id: hoodie,
            name: "Campus hoodie".into(),
            price: Money::from_cents(4_500),
            member_price: Some(Money::from_cents(3_900)),
            stock: 10,
            is_active: true,
        });
        catalog.add_ticket_type(TicketTypeRecord {
            id: ticket,
            event_id: EventId::new(),
            name: "Spring gala".into(),
            price: Money::from_cents(2_000),
            member_price: Some(Money::from_cents(1_500)),
            available: 5,
            is_active: true,
            sales_end: None,
            event_starts_at: now + Duration::days(30),
        });

        let orders = MockOrderRepository::new(catalog.clone());
        let profiles = MockProfileDirectory::new();
        let service = OrderService::new(
            Arc::new(catalog.clone()),
            Arc::new(orders.clone()),
            Arc::new(profiles.clone()),
            Arc::new(clock),
            PricingPolicy {
                currency: "EUR".into(),
                shipping_fee: Money::from_cents(495),
            },
        );

        Fixture {
            service,
            catalog,
            orders,
            profiles,
            caller: Caller::new(UserId::new(), None, Role::Student),
            hoodie,
            ticket,
        }
    }

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            full_name: "Ada Lovelace".into(),
            email: "ada@campus.test".into(),
            phone: None,
            address_line1: "12 St James's Square".into(),
            address_line2: None,
            city: "London".into(),
            postal_code: "SW1Y 4JH".into(),
            country: "GB".into(),
        }
    }

    fn mixed_cart(fx: &Fixture) -> PlaceOrderRequest {
        PlaceOrderRequest {
            items: vec![CartItem::product(fx.hoodie, 2), CartItem::ticket(fx.ticket, 3)],
            shipping: Some(shipping()),
        }
    }

    #[tokio::test]
    async fn test_places_order_at_standard_prices() {
        let fx = fixture();
        let placed = fx.service.place_order(&fx.caller, &mixed_cart(&fx)).await.unwrap();

        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.subtotal, Money::from_cents(9_000 + 6_000));
        assert_eq!(placed.shipping, Money::from_cents(495));
        assert_eq!(placed.total, Money::from_cents(15_495));

        assert_eq!(fx.catalog.product_stock(fx.hoodie), Some(8));
        assert_eq!(fx.catalog.tickets_available(fx.ticket), Some(2));

        let stored = fx.orders.order(placed.order_id).unwrap();
        assert_eq!(stored.lines.len(), 2);
        assert_eq!(stored.attendees.len(), 3);
        assert_eq!(stored.order.user_id, fx.caller.user_id);
    }

    #[tokio::test]
    async fn test_member_pricing_applied() {
        let fx = fixture();
        fx.profiles.set_member(fx.caller.user_id, true);

        let placed = fx.service.place_order(&fx.caller, &mixed_cart(&fx)).await.unwrap();

        assert_eq!(placed.subtotal, Money::from_cents(7_800 + 4_500));
        assert!(placed.lines.iter().all(|line| line.member_price_applied));
    }

    #[tokio::test]
    async fn test_client_cannot_buy_more_than_stock() {
        let fx = fixture();
        let request = PlaceOrderRequest {
            items: vec![CartItem::ticket(fx.ticket, 6)],
            shipping: None,
        };

        let err = fx.service.place_order(&fx.caller, &request).await.unwrap_err();

        assert!(matches!(err, CommerceError::OutOfStock { requested: 6, available: 5, .. }));
        assert_eq!(fx.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_write() {
        let fx = fixture();
        let request = PlaceOrderRequest {
            items: vec![CartItem::product(fx.hoodie, 1)],
            shipping: None,
        };

        let err = fx.service.place_order(&fx.caller, &request).await.unwrap_err();

        assert!(matches!(err, CommerceError::Validation(_)));
        assert_eq!(fx.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_reservation_releases_earlier_lines_and_deletes_order() {
        let fx = fixture();
        fx.orders.fail_at(FailPoint::ReserveTickets);

        let err = fx.service.place_order(&fx.caller, &mixed_cart(&fx)).await.unwrap_err();

        assert!(matches!(err, CommerceError::Persistence(_)));
        assert_eq!(fx.catalog.product_stock(fx.hoodie), Some(10));
        assert_eq!(fx.catalog.tickets_available(fx.ticket), Some(5));
        assert_eq!(fx.orders.order_count(), 0);
        assert_eq!(fx.orders.deleted_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_attendee_failure_releases_in_reverse_order() {
        let fx = fixture();
        fx.orders.fail_at(FailPoint::CreateAttendees);

        let err = fx.service.place_order(&fx.caller, &mixed_cart(&fx)).await.unwrap_err();

        assert!(matches!(err, CommerceError::Persistence(_)));
        assert_eq!(
            fx.orders.releases(),
            vec![LineTarget::Ticket(fx.ticket), LineTarget::Product(fx.hoodie)]
        );
        assert_eq!(fx.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_lost_race_reports_sold_out_while_reserving() {
        let fx = fixture();
        fx.orders.refuse_reservations(true);

        let err = fx.service.place_order(&fx.caller, &mixed_cart(&fx)).await.unwrap_err();

        assert!(matches!(err, CommerceError::SoldOutWhileReserving { .. }));
        assert!(err.to_string().contains("sold out while reserving"));
        assert_eq!(fx.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_compensation_failure_keeps_original_error() {
        let fx = fixture();
        fx.orders.fail_at(FailPoint::InsertLineItems);
        fx.orders.fail_at(FailPoint::DeleteOrder);

        let err = fx.service.place_order(&fx.caller, &mixed_cart(&fx)).await.unwrap_err();

        assert_eq!(err, CommerceError::Persistence("injected failure: insert_line_items".into()));
    }
}
