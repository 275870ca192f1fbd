//! Delete Order Use Case

use std::sync::Arc;

use crate::application::dto::DeletedOrderDto;
use crate::domain::orders::{OrderError, OrderId, OrderRepository};

use super::log_failure;

/// Use case for permanently deleting an order.
pub struct DeleteOrderUseCase<O>
where
    O: OrderRepository,
{
    order_repo: Arc<O>,
}

impl<O> DeleteOrderUseCase<O>
where
    O: OrderRepository,
{
    /// Create a new `DeleteOrderUseCase`.
    pub const fn new(order_repo: Arc<O>) -> Self {
        Self { order_repo }
    }

    /// Delete the order. A second delete of the same id is `NotFound`.
    pub async fn execute(&self, id: OrderId) -> Result<DeletedOrderDto, OrderError> {
        self.order_repo
            .delete(id)
            .await
            .inspect_err(|e| log_failure("delete", Some(id), e))?;

        tracing::info!(order_id = id.value(), "Order deleted");
        Ok(DeletedOrderDto { id, deleted: true })
    }
}
