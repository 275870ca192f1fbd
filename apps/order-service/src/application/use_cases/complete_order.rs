//! Complete Order Use Case

use std::sync::Arc;

use crate::application::dto::OrderStatusDto;
use crate::domain::orders::{OrderError, OrderId, OrderRepository, OrderStatus};

use super::log_failure;

/// Use case for marking an order completed.
pub struct CompleteOrderUseCase<O>
where
    O: OrderRepository,
{
    order_repo: Arc<O>,
}

impl<O> CompleteOrderUseCase<O>
where
    O: OrderRepository,
{
    /// Create a new `CompleteOrderUseCase`.
    pub const fn new(order_repo: Arc<O>) -> Self {
        Self { order_repo }
    }

    /// Mark the order completed. Repeating the call succeeds.
    pub async fn execute(&self, id: OrderId) -> Result<OrderStatusDto, OrderError> {
        self.order_repo
            .complete(id)
            .await
            .inspect_err(|e| log_failure("complete", Some(id), e))?;

        tracing::info!(order_id = id.value(), "Order completed");
        Ok(OrderStatusDto {
            id,
            status: OrderStatus::Completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::test_support::FailingRepository;
    use crate::domain::orders::{CreateOrderCommand, NewOrder};
    use crate::infrastructure::persistence::InMemoryOrderRepository;
    use serde_json::json;

    #[tokio::test]
    async fn completes_pending_order_twice() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let order = NewOrder::new(CreateOrderCommand {
            name: Some(json!("Ana")),
            phone: Some(json!("555")),
            location: Some(json!("Main St")),
            items: Some(json!([{"product": "Widget", "qty": 1}])),
            total: Some(json!("1")),
            idempotency_key: None,
        })
        .unwrap();
        let id = repo.create(order).await.unwrap().id;

        let use_case = CompleteOrderUseCase::new(Arc::clone(&repo));
        assert_eq!(use_case.execute(id).await.unwrap().status, OrderStatus::Completed);
        assert_eq!(use_case.execute(id).await.unwrap().status, OrderStatus::Completed);
        assert_eq!(repo.find(id).await.unwrap().status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let use_case = CompleteOrderUseCase::new(Arc::new(InMemoryOrderRepository::new()));
        assert!(matches!(
            use_case.execute(OrderId::new(999)).await,
            Err(OrderError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn storage_failure_is_propagated() {
        let use_case = CompleteOrderUseCase::new(Arc::new(FailingRepository));
        assert!(matches!(
            use_case.execute(OrderId::new(1)).await,
            Err(OrderError::Storage { .. })
        ));
    }
}
