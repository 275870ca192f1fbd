//! Orders Bounded Context
//!
//! Manages the order lifecycle from placement to completion or deletion.
//!
//! # Key Concepts
//!
//! - **Order Aggregate**: customer data, line items and total, immutable
//!   after creation
//! - **Status**: `pending -> completed`, the only mutation an order allows
//! - **Repository**: the persistence port implemented by the SQLite and
//!   in-memory adapters

pub mod aggregate;
pub mod errors;
pub mod repository;
pub mod value_objects;

pub use aggregate::{CreateOrderCommand, LineItem, NewOrder, Order};
pub use errors::{FieldViolation, OrderError};
pub use repository::{
    ExcludedRecord, ListOrder, ListQuery, OrderListing, OrderRepository, PlacedOrder,
};
pub use value_objects::{OrderId, OrderStatus, OrderTotal};
