//! Place Order Use Case

use std::sync::Arc;

use crate::application::dto::PlaceOrderResultDto;
use crate::domain::orders::{CreateOrderCommand, NewOrder, OrderError, OrderRepository};

use super::log_failure;

/// Use case for placing orders.
pub struct PlaceOrderUseCase<O>
where
    O: OrderRepository,
{
    order_repo: Arc<O>,
}

impl<O> PlaceOrderUseCase<O>
where
    O: OrderRepository,
{
    /// Create a new `PlaceOrderUseCase`.
    pub const fn new(order_repo: Arc<O>) -> Self {
        Self { order_repo }
    }

    /// Validate the command and store a new pending order.
    ///
    /// Nothing is stored unless every field is valid.
    pub async fn execute(
        &self,
        command: CreateOrderCommand,
    ) -> Result<PlaceOrderResultDto, OrderError> {
        let order = NewOrder::new(command).inspect_err(|e| log_failure("create", None, e))?;
        let item_count = order.items().len();
        let idempotency_key = order.idempotency_key().map(str::to_owned);

        let placed = self.order_repo.create(order).await.inspect_err(|e| {
            tracing::error!(
                operation = "create",
                ?idempotency_key,
                item_count,
                error = %e,
                "Failed to place order"
            );
        })?;

        if placed.replayed {
            tracing::info!(order_id = placed.id.value(), ?idempotency_key, "Order creation replayed");
        } else {
            tracing::info!(order_id = placed.id.value(), item_count, "Order placed");
        }

        Ok(placed.into())
    }
}
