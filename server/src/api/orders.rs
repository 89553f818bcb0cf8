//! Order validation endpoint.
//!
//! `POST /api/orders/validate` re-prices the cart from the catalog, reserves
//! stock and creates a pending order. Prices sent by the client are ignored.

use crate::auth::AuthenticatedCaller;
use crate::error::{auth_error, commerce_error};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use campus_auth::AuthError;
use campus_commerce::PlaceOrderRequest;
use campus_commerce::types::{LineTarget, OrderStatus, PlacedOrder, PricedLine};
use campus_core::{OrderId, UserId};
use campus_web::{CorrelationId, WebResult};
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// Successful order response.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// New order id
    pub order_id: OrderId,
    /// Order status
    pub status: OrderStatus,
    /// ISO 4217 currency code
    pub currency: String,
    /// Sum of line totals
    pub subtotal_cents: u64,
    /// Shipping fee
    pub shipping_cents: u64,
    /// Amount due
    pub total_cents: u64,
    /// Priced lines
    pub items: Vec<OrderItemResponse>,
}

/// One priced line in [`OrderResponse`].
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    /// `product` or `ticket`
    pub kind: &'static str,
    /// Product or ticket type id
    pub id: Uuid,
    /// Catalog name
    pub name: String,
    /// Quantity
    pub quantity: u32,
    /// Unit price charged
    pub unit_price_cents: u64,
    /// `unit_price_cents * quantity`
    pub line_total_cents: u64,
    /// Whether the member price was used
    pub member_price_applied: bool,
}

impl From<&PricedLine> for OrderItemResponse {
    fn from(line: &PricedLine) -> Self {
        let (kind, id) = match line.target {
            LineTarget::Product(id) => ("product", *id.as_uuid()),
            LineTarget::Ticket(id) => ("ticket", *id.as_uuid()),
        };

        Self {
            kind,
            id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            line_total_cents: line.line_total.cents(),
            member_price_applied: line.member_price_applied,
        }
    }
}

impl From<PlacedOrder> for OrderResponse {
    fn from(order: PlacedOrder) -> Self {
        Self {
            order_id: order.order_id,
            status: order.status,
            currency: order.currency,
            subtotal_cents: order.subtotal.cents(),
            shipping_cents: order.shipping.cents(),
            total_cents: order.total.cents(),
            items: order.lines.iter().map(OrderItemResponse::from).collect(),
        }
    }
}

/// Rate limit key for a user's order validations.
#[must_use]
pub fn rate_limit_key(user_id: UserId) -> String {
    format!("validate-order:{user_id}")
}

/// Validate and place an order.
///
/// # Status Codes
///
/// - 201 Created: order placed
/// - 401 Unauthorized: missing or invalid token
/// - 409 Conflict: an item is unavailable or sold out
/// - 422 Unprocessable Entity: invalid cart or shipping details
/// - 429 Too Many Requests: order rate limit exceeded
///
/// # Errors
///
/// Returns a [`campus_web::AppError`] mapped from the failing step.
pub async fn validate_order(
    State(state): State<AppState>,
    CorrelationId(request_id): CorrelationId,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Json(request): Json<PlaceOrderRequest>,
) -> WebResult<(StatusCode, Json<OrderResponse>)> {
    let key = rate_limit_key(caller.user_id);
    match state
        .rate_limiter
        .check_and_record(&key, state.order_rate_limit)
        .await
    {
        Ok(status) => {
            tracing::debug!(key = %key, remaining = status.remaining, "Rate limit checked");
        }
        Err(err @ AuthError::TooManyAttempts { .. }) => {
            metrics::counter!("campus_rate_limit_rejections_total", "route" => "orders_validate")
                .increment(1);
            tracing::warn!(user_id = %caller.user_id, "Order validation rate limited");
            return Err(auth_error(err));
        }
        Err(err) => return Err(auth_error(err)),
    }

    let started = Instant::now();
    let result = state.orders.place_order(&caller, &request).await;
    metrics::histogram!("campus_order_duration_seconds").record(started.elapsed().as_secs_f64());

    let order = result.map_err(commerce_error)?;
    tracing::info!(
        request_id = %request_id,
        order_id = %order.order_id,
        total_cents = order.total.cents(),
        "Order accepted"
    );
    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::{Money, ProductId};

    #[test]
    fn test_rate_limit_key_is_per_user() {
        let user = UserId::new();
        assert_eq!(rate_limit_key(user), format!("validate-order:{user}"));
    }

    #[test]
    fn test_item_response_from_line() {
        let product = ProductId::new();
        let line = PricedLine {
            target: LineTarget::Product(product),
            name: "Hoodie".into(),
            quantity: 2,
            unit_price: Money::from_cents(2_500),
            line_total: Money::from_cents(5_000),
            member_price_applied: true,
        };

        let item = OrderItemResponse::from(&line);
        assert_eq!(item.kind, "product");
        assert_eq!(item.id, *product.as_uuid());
        assert_eq!(item.line_total_cents, 5_000);
        assert!(item.member_price_applied);
    }
}
