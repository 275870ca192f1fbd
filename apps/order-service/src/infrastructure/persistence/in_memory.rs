//! In-memory order repository for testing.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::orders::{
    ListOrder, ListQuery, NewOrder, Order, OrderError, OrderId, OrderListing, OrderRepository,
    PlacedOrder,
};

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    orders: BTreeMap<OrderId, Order>,
    idempotency_keys: HashMap<String, OrderId>,
}

/// In-memory implementation of `OrderRepository`.
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    inner: RwLock<Inner>,
}

impl InMemoryOrderRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of orders in the repository.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().orders.len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().orders.is_empty()
    }

    /// Insert a fully built order (for test setup).
    pub fn add(&self, order: Order) {
        let mut inner = self.inner.write();
        inner.last_id = inner.last_id.max(order.id.value());
        if let Some(key) = &order.idempotency_key {
            inner.idempotency_keys.insert(key.clone(), order.id);
        }
        inner.orders.insert(order.id, order);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<PlacedOrder, OrderError> {
        let mut inner = self.inner.write();

        if let Some(existing) = order
            .idempotency_key()
            .and_then(|key| inner.idempotency_keys.get(key))
        {
            return Ok(PlacedOrder::replayed(*existing));
        }

        // Ids are never reused, even after the newest order is deleted.
        inner.last_id += 1;
        let id = OrderId::new(inner.last_id);
        if let Some(key) = order.idempotency_key() {
            inner.idempotency_keys.insert(key.to_string(), id);
        }
        inner.orders.insert(id, order.into_order(id, Utc::now()));
        Ok(PlacedOrder::inserted(id))
    }

    async fn list(&self, query: ListQuery) -> Result<OrderListing, OrderError> {
        let inner = self.inner.read();
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();

        if query.order == ListOrder::MostRecentFirst {
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        }

        Ok(OrderListing {
            orders,
            excluded: Vec::new(),
        })
    }

    async fn find(&self, id: OrderId) -> Result<Order, OrderError> {
        self.inner
            .read()
            .orders
            .get(&id)
            .cloned()
            .ok_or(OrderError::NotFound { order_id: id })
    }

    async fn complete(&self, id: OrderId) -> Result<(), OrderError> {
        let mut inner = self.inner.write();
        let order = inner
            .orders
            .get_mut(&id)
            .ok_or(OrderError::NotFound { order_id: id })?;
        order.complete();
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<(), OrderError> {
        let mut inner = self.inner.write();
        let order = inner
            .orders
            .remove(&id)
            .ok_or(OrderError::NotFound { order_id: id })?;
        if let Some(key) = order.idempotency_key {
            inner.idempotency_keys.remove(&key);
        }
        Ok(())
    }
}
