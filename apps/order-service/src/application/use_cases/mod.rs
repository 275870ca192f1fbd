//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod complete_order;
mod delete_order;
mod get_order;
mod list_orders;
mod place_order;

pub use complete_order::CompleteOrderUseCase;
pub use delete_order::DeleteOrderUseCase;
pub use get_order::GetOrderUseCase;
pub use list_orders::ListOrdersUseCase;
pub use place_order::PlaceOrderUseCase;

use crate::domain::orders::{OrderError, OrderId};

/// Log a failed operation at a level matching its category.
///
/// Storage failures are logged in full here because clients only ever see a
/// generic message.
fn log_failure(operation: &'static str, order_id: Option<OrderId>, err: &OrderError) {
    let order_id = order_id.map(|id| id.value());
    match err {
        OrderError::Storage { .. } => {
            tracing::error!(operation, order_id, error = %err, "Order storage failure");
        }
        OrderError::DataCorruption { .. } => {
            tracing::error!(operation, order_id, error = %err, "Stored order could not be decoded");
        }
        OrderError::Validation { .. } | OrderError::NotFound { .. } => {
            tracing::debug!(operation, order_id, error = %err, "Order request rejected");
        }
    }
}
