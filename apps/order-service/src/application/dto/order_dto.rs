//! Order DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::orders::{
    ExcludedRecord, LineItem, Order, OrderId, OrderListing, OrderStatus, OrderTotal, PlacedOrder,
};

/// DTO representing an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDto {
    /// Order ID.
    pub id: OrderId,
    /// Customer name.
    pub name: String,
    /// Customer phone.
    pub phone: String,
    /// Delivery location.
    pub location: String,
    /// Line items.
    pub items: Vec<LineItem>,
    /// Total as a decimal string.
    pub total: OrderTotal,
    /// Status.
    pub status: OrderStatus,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Idempotency key, if the order was placed with one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            name: order.name,
            phone: order.phone,
            location: order.location,
            items: order.items,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
            idempotency_key: order.idempotency_key,
        }
    }
}

/// DTO for a stored record left out of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRecordDto {
    /// Row id.
    pub id: OrderId,
    /// Column that failed to decode.
    pub field: String,
    /// Decoder message.
    pub reason: String,
}

impl From<ExcludedRecord> for ExcludedRecordDto {
    fn from(record: ExcludedRecord) -> Self {
        Self {
            id: record.id,
            field: record.field,
            reason: record.reason,
        }
    }
}

/// DTO for a listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderListDto {
    /// Decoded orders.
    pub orders: Vec<OrderDto>,
    /// Records that could not be decoded.
    pub excluded: Vec<ExcludedRecordDto>,
}

impl From<OrderListing> for OrderListDto {
    fn from(listing: OrderListing) -> Self {
        Self {
            orders: listing.orders.into_iter().map(OrderDto::from).collect(),
            excluded: listing
                .excluded
                .into_iter()
                .map(ExcludedRecordDto::from)
                .collect(),
        }
    }
}

/// Result of placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderResultDto {
    /// Assigned (or replayed) order ID.
    pub order_id: OrderId,
    /// Whether an earlier order with the same idempotency key was returned.
    pub replayed: bool,
}

impl From<PlacedOrder> for PlaceOrderResultDto {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            order_id: placed.id,
            replayed: placed.replayed,
        }
    }
}

/// Result of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusDto {
    /// Order ID.
    pub id: OrderId,
    /// Status after the change.
    pub status: OrderStatus,
}

/// Result of a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedOrderDto {
    /// Order ID.
    pub id: OrderId,
    /// Always true.
    pub deleted: bool,
}
