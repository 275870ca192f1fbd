//! Order Repository Trait
//!
//! Defines the persistence abstraction for orders.
//! Implemented by adapters in the infrastructure layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::aggregate::{NewOrder, Order};
use super::errors::OrderError;
use super::value_objects::{OrderId, OrderStatus};

/// Row ordering for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    /// Ascending id, i.e. the order rows were inserted in.
    #[default]
    Insertion,
    /// Newest `created_at` first, ties broken by descending id.
    MostRecentFirst,
}

/// Filter and ordering for [`OrderRepository::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListQuery {
    /// Only return orders in this status.
    pub status: Option<OrderStatus>,
    /// Row ordering.
    pub order: ListOrder,
}

impl ListQuery {
    /// Every order, insertion order.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            status: None,
            order: ListOrder::Insertion,
        }
    }

    /// Every order, most recent first.
    #[must_use]
    pub const fn history() -> Self {
        Self {
            status: None,
            order: ListOrder::MostRecentFirst,
        }
    }

    /// Restrict to one status.
    #[must_use]
    pub const fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// A stored record left out of a listing because it could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRecord {
    /// Row id.
    pub id: OrderId,
    /// Column that failed to decode.
    pub field: String,
    /// Decoder message.
    pub reason: String,
}

impl ExcludedRecord {
    /// Build from a `DataCorruption` error; `None` for other errors.
    #[must_use]
    pub fn from_error(err: &OrderError) -> Option<Self> {
        match err {
            OrderError::DataCorruption {
                order_id,
                field,
                reason,
            } => Some(Self {
                id: *order_id,
                field: (*field).to_string(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

/// Result of [`OrderRepository::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedOrder {
    /// Id of the stored order.
    pub id: OrderId,
    /// True if an order with the same idempotency key already existed and
    /// nothing was inserted.
    pub replayed: bool,
}

impl PlacedOrder {
    /// A freshly inserted order.
    #[must_use]
    pub const fn inserted(id: OrderId) -> Self {
        Self { id, replayed: false }
    }

    /// An earlier order returned for a repeated idempotency key.
    #[must_use]
    pub const fn replayed(id: OrderId) -> Self {
        Self { id, replayed: true }
    }
}

/// Result of a listing: decodable orders plus the records that were not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderListing {
    /// Decoded orders, in the requested order.
    pub orders: Vec<Order>,
    /// Corrupt records excluded from `orders`.
    pub excluded: Vec<ExcludedRecord>,
}

impl OrderListing {
    /// Number of decoded orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// True if no decodable order was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Repository trait for Order persistence.
///
/// This is a domain interface (port) that is implemented by
/// infrastructure adapters (SQLite, in-memory).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new pending order and return its assigned id.
    ///
    /// If the order carries an idempotency key that is already stored, the
    /// existing order's id is returned and nothing is inserted.
    async fn create(&self, order: NewOrder) -> Result<PlacedOrder, OrderError>;

    /// List orders matching `query`.
    ///
    /// A record that fails to decode is excluded and reported in
    /// [`OrderListing::excluded`]; it never fails the whole call.
    async fn list(&self, query: ListQuery) -> Result<OrderListing, OrderError>;

    /// Load a single order.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `DataCorruption` if the row cannot be decoded.
    async fn find(&self, id: OrderId) -> Result<Order, OrderError>;

    /// Mark an order completed. Completing a completed order succeeds.
    ///
    /// # Errors
    ///
    /// `NotFound` if no order has this id.
    async fn complete(&self, id: OrderId) -> Result<(), OrderError>;

    /// Permanently delete an order.
    ///
    /// # Errors
    ///
    /// `NotFound` if no order has this id.
    async fn delete(&self, id: OrderId) -> Result<(), OrderError>;
}
