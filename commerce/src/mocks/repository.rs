//! In-memory order repository with failure injection.

use super::catalog::MockCatalog;
use crate::error::{CommerceError, Result};
use crate::repository::OrderRepository;
use crate::types::{AttendeePlaceholder, LineTarget, NewOrder, PricedLine};
use async_trait::async_trait;
use campus_core::{OrderId, ProductId, TicketTypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Repository call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// `create_order`
    CreateOrder,
    /// `insert_line_items`
    InsertLineItems,
    /// `reserve_product_stock`
    ReserveProduct,
    /// `reserve_tickets`
    ReserveTickets,
    /// `create_attendee_placeholders`
    CreateAttendees,
    /// `release_product_stock` and `release_tickets`
    Release,
    /// `delete_order`
    DeleteOrder,
}

impl FailPoint {
    const fn operation(self) -> &'static str {
        match self {
            Self::CreateOrder => "create_order",
            Self::InsertLineItems => "insert_line_items",
            Self::ReserveProduct => "reserve_product_stock",
            Self::ReserveTickets => "reserve_tickets",
            Self::CreateAttendees => "create_attendee_placeholders",
            Self::Release => "release",
            Self::DeleteOrder => "delete_order",
        }
    }
}

/// An order as held by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOrder {
    /// Header
    pub order: NewOrder,
    /// Line items
    pub lines: Vec<PricedLine>,
    /// Attendee placeholders
    pub attendees: Vec<AttendeePlaceholder>,
}

#[derive(Debug, Default)]
struct State {
    orders: HashMap<OrderId, StoredOrder>,
    failures: HashSet<FailPoint>,
    refuse_reservations: bool,
    releases: Vec<LineTarget>,
    deleted: Vec<OrderId>,
}

/// In-memory [`OrderRepository`] reserving against a [`MockCatalog`].
#[derive(Debug, Clone)]
pub struct MockOrderRepository {
    catalog: MockCatalog,
    state: Arc<Mutex<State>>,
}

impl MockOrderRepository {
    /// Create a repository over `catalog`'s stock.
    #[must_use]
    pub fn new(catalog: MockCatalog) -> Self {
        Self {
            catalog,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Make `point` fail from now on.
    pub fn fail_at(&self, point: FailPoint) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.insert(point);
        }
    }

    /// Make every reservation report "not enough stock", as if another
    /// buyer won the race after the catalog check.
    pub fn refuse_reservations(&self, refuse: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.refuse_reservations = refuse;
        }
    }

    /// Stored order by id.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<StoredOrder> {
        self.state.lock().ok()?.orders.get(&id).cloned()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.state.lock().map_or(0, |state| state.orders.len())
    }

    /// Released reservations, in call order.
    #[must_use]
    pub fn releases(&self) -> Vec<LineTarget> {
        self.state
            .lock()
            .map_or_else(|_| Vec::new(), |state| state.releases.clone())
    }

    /// Deleted order ids, in call order.
    #[must_use]
    pub fn deleted_orders(&self) -> Vec<OrderId> {
        self.state
            .lock()
            .map_or_else(|_| Vec::new(), |state| state.deleted.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| CommerceError::Persistence("Lock poisoned".into()))
    }

    fn check(&self, point: FailPoint) -> Result<std::sync::MutexGuard<'_, State>> {
        let state = self.lock()?;
        if state.failures.contains(&point) {
            return Err(CommerceError::Persistence(format!(
                "injected failure: {}",
                point.operation()
            )));
        }
        Ok(state)
    }

    fn stored(state: &mut State, order_id: OrderId) -> Result<&mut StoredOrder> {
        state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| CommerceError::Persistence(format!("order {order_id} not found")))
    }
}

#[async_trait]
impl OrderRepository for MockOrderRepository {
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId> {
        let mut state = self.check(FailPoint::CreateOrder)?;
        let id = OrderId::new();
        state.orders.insert(
            id,
            StoredOrder {
                order: order.clone(),
                lines: Vec::new(),
                attendees: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn insert_line_items(&self, order_id: OrderId, lines: &[PricedLine]) -> Result<()> {
        let mut state = self.check(FailPoint::InsertLineItems)?;
        Self::stored(&mut state, order_id)?.lines.extend_from_slice(lines);
        Ok(())
    }

    async fn reserve_product_stock(&self, product_id: ProductId, quantity: u32) -> Result<bool> {
        let state = self.check(FailPoint::ReserveProduct)?;
        if state.refuse_reservations {
            return Ok(false);
        }
        drop(state);
        self.catalog.adjust_product(product_id, -i64::from(quantity))
    }

    async fn reserve_tickets(&self, ticket_type_id: TicketTypeId, quantity: u32) -> Result<bool> {
        let state = self.check(FailPoint::ReserveTickets)?;
        if state.refuse_reservations {
            return Ok(false);
        }
        drop(state);
        self.catalog.adjust_tickets(ticket_type_id, -i64::from(quantity))
    }

    async fn release_product_stock(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        self.check(FailPoint::Release)?
            .releases
            .push(LineTarget::Product(product_id));
        self.catalog.adjust_product(product_id, i64::from(quantity))?;
        Ok(())
    }

    async fn release_tickets(&self, ticket_type_id: TicketTypeId, quantity: u32) -> Result<()> {
        self.check(FailPoint::Release)?
            .releases
            .push(LineTarget::Ticket(ticket_type_id));
        self.catalog.adjust_tickets(ticket_type_id, i64::from(quantity))?;
        Ok(())
    }

    async fn create_attendee_placeholders(
        &self,
        order_id: OrderId,
        attendees: &[AttendeePlaceholder],
    ) -> Result<()> {
        let mut state = self.check(FailPoint::CreateAttendees)?;
        Self::stored(&mut state, order_id)?
            .attendees
            .extend_from_slice(attendees);
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<()> {
        let mut state = self.check(FailPoint::DeleteOrder)?;
        state.orders.remove(&order_id);
        state.deleted.push(order_id);
        Ok(())
    }
}
