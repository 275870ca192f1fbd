//! List Orders Use Case

use std::sync::Arc;

use crate::application::dto::OrderListDto;
use crate::domain::orders::{ListQuery, OrderError, OrderRepository};

use super::log_failure;

/// Use case for listing orders, optionally filtered by status.
pub struct ListOrdersUseCase<O>
where
    O: OrderRepository,
{
    order_repo: Arc<O>,
}

impl<O> ListOrdersUseCase<O>
where
    O: OrderRepository,
{
    /// Create a new `ListOrdersUseCase`.
    pub const fn new(order_repo: Arc<O>) -> Self {
        Self { order_repo }
    }

    /// List orders matching `query`. Reads the store on every call.
    pub async fn execute(&self, query: ListQuery) -> Result<OrderListDto, OrderError> {
        let listing = self
            .order_repo
            .list(query)
            .await
            .inspect_err(|e| log_failure("list", None, e))?;

        if !listing.excluded.is_empty() {
            tracing::warn!(
                excluded = listing.excluded.len(),
                returned = listing.len(),
                "Listing excluded undecodable orders"
            );
        }

        Ok(listing.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::test_support::FailingRepository;
    use crate::domain::orders::{CreateOrderCommand, NewOrder, OrderStatus};
    use crate::infrastructure::persistence::InMemoryOrderRepository;
    use serde_json::json;

    fn new_order(name: &str) -> NewOrder {
        NewOrder::new(CreateOrderCommand {
            name: Some(json!(name)),
            phone: Some(json!("555")),
            location: Some(json!("Main St")),
            items: Some(json!([{"product": "Widget", "qty": 1}])),
            total: Some(json!("1.00")),
            idempotency_key: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn lists_by_status() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        repo.create(new_order("Ana")).await.unwrap();
        let done = repo.create(new_order("Ben")).await.unwrap().id;
        repo.complete(done).await.unwrap();

        let use_case = ListOrdersUseCase::new(repo);
        let all = use_case.execute(ListQuery::all()).await.unwrap();
        assert_eq!(all.orders.len(), 2);

        let completed = use_case
            .execute(ListQuery::all().with_status(OrderStatus::Completed))
            .await
            .unwrap();
        assert_eq!(completed.orders.len(), 1);
        assert_eq!(completed.orders[0].name, "Ben");
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let use_case = ListOrdersUseCase::new(Arc::new(InMemoryOrderRepository::new()));
        let listing = use_case.execute(ListQuery::history()).await.unwrap();
        assert!(listing.orders.is_empty());
        assert!(listing.excluded.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_propagated() {
        let use_case = ListOrdersUseCase::new(Arc::new(FailingRepository));
        assert!(use_case.execute(ListQuery::all()).await.is_err());
    }
}
