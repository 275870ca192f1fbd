//! Get Order Use Case

use std::sync::Arc;

use crate::application::dto::OrderDto;
use crate::domain::orders::{OrderError, OrderId, OrderRepository};

use super::log_failure;

/// Use case for loading a single order.
pub struct GetOrderUseCase<O>
where
    O: OrderRepository,
{
    order_repo: Arc<O>,
}

impl<O> GetOrderUseCase<O>
where
    O: OrderRepository,
{
    /// Create a new `GetOrderUseCase`.
    pub const fn new(order_repo: Arc<O>) -> Self {
        Self { order_repo }
    }

    /// Load the order with `id`.
    pub async fn execute(&self, id: OrderId) -> Result<OrderDto, OrderError> {
        self.order_repo
            .find(id)
            .await
            .map(OrderDto::from)
            .inspect_err(|e| log_failure("find", Some(id), e))
    }
}
