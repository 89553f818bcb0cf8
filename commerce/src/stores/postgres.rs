//! `PostgreSQL` catalog and order repository.
//!
//! Tables are owned by the BaaS schema:
//!
//! - `products(id, name, price_cents, member_price_cents, stock, is_active)`
//! - `event_ticket_types(id, event_id, name, price_cents, member_price_cents,
//!   quantity_available, is_active, sales_end)` joined to `events(id, starts_at)`
//! - `orders`, `order_items`, `event_attendees`
//!
//! Stock moves only through the `reserve_*` / `release_*` SQL functions
//! (see `server/migrations`), each a single guarded `UPDATE`.
//!
//! # Example
//!
//! ```no_run
//! use campus_commerce::stores::{PostgresCatalog, PostgresOrderRepository};
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/campus").await?;
//! let catalog = PostgresCatalog::new(pool.clone());
//! let orders = PostgresOrderRepository::new(pool);
//! # Ok(())
//! # }
//! ```

use crate::catalog::{Catalog, ProductRecord, TicketTypeRecord};
use crate::error::{CommerceError, Result};
use crate::repository::OrderRepository;
use crate::types::{AttendeePlaceholder, LineTarget, NewOrder, PricedLine};
use async_trait::async_trait;
use campus_core::{DateTime, EventId, Money, OrderId, ProductId, TicketTypeId, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

fn money(row: &PgRow, column: &str) -> Result<Money> {
    let cents: i64 = row.try_get(column).map_err(catalog_error)?;
    Money::from_db_cents(cents)
        .ok_or_else(|| CommerceError::Catalog(format!("negative amount in {column}")))
}

fn optional_money(row: &PgRow, column: &str) -> Result<Option<Money>> {
    let cents: Option<i64> = row.try_get(column).map_err(catalog_error)?;
    Ok(cents.and_then(Money::from_db_cents))
}

fn count(row: &PgRow, column: &str) -> Result<u32> {
    let value: i32 = row.try_get(column).map_err(catalog_error)?;
    Ok(u32::try_from(value).unwrap_or(0))
}

fn catalog_error(err: sqlx::Error) -> CommerceError {
    CommerceError::Catalog(err.to_string())
}

fn db_quantity(quantity: u32) -> i32 {
    i32::try_from(quantity).unwrap_or(i32::MAX)
}

// ============================================================================
// Catalog
// ============================================================================

/// `PostgreSQL`-backed [`Catalog`].
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Create a catalog over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for PostgresCatalog {
    async fn product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, name, price_cents, member_price_cents, stock, is_active
            FROM products
            WHERE id = $1
            ",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(catalog_error)?;

        row.map(|row| {
            Ok(ProductRecord {
                id,
                name: row.try_get("name").map_err(catalog_error)?,
                price: money(&row, "price_cents")?,
                member_price: optional_money(&row, "member_price_cents")?,
                stock: count(&row, "stock")?,
                is_active: row.try_get("is_active").map_err(catalog_error)?,
            })
        })
        .transpose()
    }

    async fn ticket_type(&self, id: TicketTypeId) -> Result<Option<TicketTypeRecord>> {
        let row = sqlx::query(
            r"
            SELECT t.id, t.event_id, t.name, t.price_cents, t.member_price_cents,
                   t.quantity_available, t.is_active, t.sales_end,
                   e.starts_at AS event_starts_at
            FROM event_ticket_types t
            JOIN events e ON e.id = t.event_id
            WHERE t.id = $1
            ",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(catalog_error)?;

        row.map(|row| {
            let event_id: Uuid = row.try_get("event_id").map_err(catalog_error)?;
            let sales_end: Option<DateTime<Utc>> =
                row.try_get("sales_end").map_err(catalog_error)?;
            let event_starts_at: DateTime<Utc> =
                row.try_get("event_starts_at").map_err(catalog_error)?;

            Ok(TicketTypeRecord {
                id,
                event_id: EventId::from_uuid(event_id),
                name: row.try_get("name").map_err(catalog_error)?,
                price: money(&row, "price_cents")?,
                member_price: optional_money(&row, "member_price_cents")?,
                available: count(&row, "quantity_available")?,
                is_active: row.try_get("is_active").map_err(catalog_error)?,
                sales_end,
                event_starts_at,
            })
        })
        .transpose()
    }
}

// ============================================================================
// Orders
// ============================================================================

/// `PostgreSQL`-backed [`OrderRepository`].
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Create a repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn call_reserve(&self, function: &str, id: Uuid, quantity: u32) -> Result<bool> {
        let reserved: bool = sqlx::query_scalar(&format!("SELECT {function}($1, $2)"))
            .bind(id)
            .bind(db_quantity(quantity))
            .fetch_one(&self.pool)
            .await?;
        Ok(reserved)
    }

    async fn call_release(&self, function: &str, id: Uuid, quantity: u32) -> Result<()> {
        sqlx::query(&format!("SELECT {function}($1, $2)"))
            .bind(id)
            .bind(db_quantity(quantity))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId> {
        let id = OrderId::new();

        sqlx::query(
            r"
            INSERT INTO orders (id, user_id, status, currency, subtotal_cents,
                                shipping_cents, total_cents, shipping_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(*id.as_uuid())
        .bind(*order.user_id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.currency)
        .bind(order.subtotal.to_db_cents())
        .bind(order.shipping.to_db_cents())
        .bind(order.total.to_db_cents())
        .bind(order.shipping_info.as_ref().map(Json))
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(order_id = %id, "Order row created");
        Ok(id)
    }

    async fn insert_line_items(&self, order_id: OrderId, lines: &[PricedLine]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO order_items (order_id, product_id, event_ticket_type_id, name, \
             quantity, unit_price_cents, total_cents, member_price_applied) ",
        );
        builder.push_values(lines, |mut row, line| {
            let (product_id, ticket_type_id) = match line.target {
                LineTarget::Product(id) => (Some(*id.as_uuid()), None),
                LineTarget::Ticket(id) => (None, Some(*id.as_uuid())),
            };
            row.push_bind(*order_id.as_uuid())
                .push_bind(product_id)
                .push_bind(ticket_type_id)
                .push_bind(line.name.clone())
                .push_bind(db_quantity(line.quantity))
                .push_bind(line.unit_price.to_db_cents())
                .push_bind(line.line_total.to_db_cents())
                .push_bind(line.member_price_applied);
        });

        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn reserve_product_stock(&self, product_id: ProductId, quantity: u32) -> Result<bool> {
        self.call_reserve("reserve_product_stock", *product_id.as_uuid(), quantity)
            .await
    }

    async fn reserve_tickets(&self, ticket_type_id: TicketTypeId, quantity: u32) -> Result<bool> {
        self.call_reserve("reserve_event_tickets", *ticket_type_id.as_uuid(), quantity)
            .await
    }

    async fn release_product_stock(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        self.call_release("release_product_stock", *product_id.as_uuid(), quantity)
            .await
    }

    async fn release_tickets(&self, ticket_type_id: TicketTypeId, quantity: u32) -> Result<()> {
        self.call_release("release_event_tickets", *ticket_type_id.as_uuid(), quantity)
            .await
    }

    async fn create_attendee_placeholders(
        &self,
        order_id: OrderId,
        attendees: &[AttendeePlaceholder],
    ) -> Result<()> {
        if attendees.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO event_attendees (order_id, event_id, ticket_type_id, attendee_name, status) ",
        );
        builder.push_values(attendees, |mut row, attendee| {
            row.push_bind(*order_id.as_uuid())
                .push_bind(*attendee.event_id.as_uuid())
                .push_bind(*attendee.ticket_type_id.as_uuid())
                .push_bind(None::<String>)
                .push_bind("pending");
        });

        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for table in ["event_attendees", "order_items"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE order_id = $1"))
                .bind(*order_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(*order_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(order_id = %order_id, "Order row deleted");
        Ok(())
    }
}
