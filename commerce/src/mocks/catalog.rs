//! In-memory catalog.

use crate::catalog::{Catalog, ProductRecord, TicketTypeRecord};
use crate::error::{CommerceError, Result};
use async_trait::async_trait;
use campus_core::{ProductId, TicketTypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Inventory {
    products: HashMap<ProductId, ProductRecord>,
    ticket_types: HashMap<TicketTypeId, TicketTypeRecord>,
    unavailable: bool,
}

/// In-memory [`Catalog`].
///
/// Clones share state. [`crate::mocks::MockOrderRepository`] reserves
/// against the same inventory, so a test sees stock move.
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    inventory: Arc<RwLock<Inventory>>,
}

impl MockCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a product.
    pub fn add_product(&self, record: ProductRecord) {
        if let Ok(mut inventory) = self.inventory.write() {
            inventory.products.insert(record.id, record);
        }
    }

    /// Add or replace a ticket type.
    pub fn add_ticket_type(&self, record: TicketTypeRecord) {
        if let Ok(mut inventory) = self.inventory.write() {
            inventory.ticket_types.insert(record.id, record);
        }
    }

    /// Make every lookup fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut inventory) = self.inventory.write() {
            inventory.unavailable = unavailable;
        }
    }

    /// Current stock of a product.
    #[must_use]
    pub fn product_stock(&self, id: ProductId) -> Option<u32> {
        self.inventory
            .read()
            .ok()
            .and_then(|inventory| inventory.products.get(&id).map(|p| p.stock))
    }

    /// Tickets left for a ticket type.
    #[must_use]
    pub fn tickets_available(&self, id: TicketTypeId) -> Option<u32> {
        self.inventory
            .read()
            .ok()
            .and_then(|inventory| inventory.ticket_types.get(&id).map(|t| t.available))
    }

    /// Adjust a product's stock. Returns `false` if it would go negative.
    pub(crate) fn adjust_product(&self, id: ProductId, delta: i64) -> Result<bool> {
        let mut inventory = self.write()?;
        let Some(product) = inventory.products.get_mut(&id) else {
            return Ok(false);
        };
        Ok(apply(&mut product.stock, delta))
    }

    /// Adjust a ticket type's availability. Returns `false` if it would go negative.
    pub(crate) fn adjust_tickets(&self, id: TicketTypeId, delta: i64) -> Result<bool> {
        let mut inventory = self.write()?;
        let Some(ticket) = inventory.ticket_types.get_mut(&id) else {
            return Ok(false);
        };
        Ok(apply(&mut ticket.available, delta))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inventory>> {
        self.inventory
            .write()
            .map_err(|_| CommerceError::Persistence("Lock poisoned".into()))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inventory>> {
        let inventory = self
            .inventory
            .read()
            .map_err(|_| CommerceError::Catalog("Lock poisoned".into()))?;
        if inventory.unavailable {
            return Err(CommerceError::Catalog("catalog unavailable".into()));
        }
        Ok(inventory)
    }
}

fn apply(level: &mut u32, delta: i64) -> bool {
    match u32::try_from(i64::from(*level) + delta) {
        Ok(next) => {
            *level = next;
            true
        }
        Err(_) => false,
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn ticket_type(&self, id: TicketTypeId) -> Result<Option<TicketTypeRecord>> {
        Ok(self.read()?.ticket_types.get(&id).cloned())
    }
}
