//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to application use cases.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::dto::{DeletedOrderDto, OrderDto, OrderStatusDto};
use crate::application::use_cases::{
    CompleteOrderUseCase, DeleteOrderUseCase, GetOrderUseCase, ListOrdersUseCase,
    PlaceOrderUseCase,
};
use crate::config::ServerConfig;
use crate::domain::orders::{ListOrder, OrderRepository};
use crate::error::{ApiError, ErrorCode};

use super::request::{
    IDEMPOTENCY_KEY_HEADER, ListOrdersParams, PlaceOrderRequest, parse_order_id,
};
use super::response::{HealthResponse, OrderListResponse, PlaceOrderResponse};

/// Application state shared across handlers.
pub struct AppState<O>
where
    O: OrderRepository,
{
    /// Use case for placing orders.
    pub place_order: Arc<PlaceOrderUseCase<O>>,
    /// Use case for listing orders.
    pub list_orders: Arc<ListOrdersUseCase<O>>,
    /// Use case for loading one order.
    pub get_order: Arc<GetOrderUseCase<O>>,
    /// Use case for completing orders.
    pub complete_order: Arc<CompleteOrderUseCase<O>>,
    /// Use case for deleting orders.
    pub delete_order: Arc<DeleteOrderUseCase<O>>,
    /// Application version.
    pub version: String,
}

impl<O> AppState<O>
where
    O: OrderRepository,
{
    /// Wire every use case to the same repository.
    pub fn new(order_repo: Arc<O>, version: impl Into<String>) -> Self {
        Self {
            place_order: Arc::new(PlaceOrderUseCase::new(Arc::clone(&order_repo))),
            list_orders: Arc::new(ListOrdersUseCase::new(Arc::clone(&order_repo))),
            get_order: Arc::new(GetOrderUseCase::new(Arc::clone(&order_repo))),
            complete_order: Arc::new(CompleteOrderUseCase::new(Arc::clone(&order_repo))),
            delete_order: Arc::new(DeleteOrderUseCase::new(order_repo)),
            version: version.into(),
        }
    }
}

impl<O> Clone for AppState<O>
where
    O: OrderRepository,
{
    fn clone(&self) -> Self {
        Self {
            place_order: Arc::clone(&self.place_order),
            list_orders: Arc::clone(&self.list_orders),
            get_order: Arc::clone(&self.get_order),
            complete_order: Arc::clone(&self.complete_order),
            delete_order: Arc::clone(&self.delete_order),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints and middleware.
pub fn create_router<O>(state: AppState<O>, server: &ServerConfig) -> Router
where
    O: OrderRepository + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/order", post(place_order))
        .route("/orders", get(list_orders))
        .route("/orders/history", get(order_history))
        .route("/orders/{id}", get(get_order).delete(delete_order))
        .route("/orders/{id}/complete", post(complete_order))
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check<O>(State(state): State<AppState<O>>) -> impl IntoResponse
where
    O: OrderRepository,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Place order endpoint.
///
/// 201 for a new order, 200 when an idempotency key replays an earlier one.
async fn place_order<O>(
    State(state): State<AppState<O>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), ApiError>
where
    O: OrderRepository,
{
    let request = PlaceOrderRequest::from_slice(&body)?;

    let header_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let request = request.with_fallback_idempotency_key(header_key);

    let result = state.place_order.execute(request.into()).await?;
    let status = if result.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(result.into())))
}

/// List orders endpoint.
async fn list_orders<O>(
    State(state): State<AppState<O>>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<OrderListResponse>, ApiError>
where
    O: OrderRepository,
{
    let Query(params) =
        params.map_err(|rejection| ApiError::new(ErrorCode::ValidationError, rejection.body_text()))?;
    let listing = state.list_orders.execute(params.to_query()?).await?;
    Ok(Json(listing))
}

/// Order history endpoint: most recent first.
async fn order_history<O>(
    State(state): State<AppState<O>>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<OrderListResponse>, ApiError>
where
    O: OrderRepository,
{
    let Query(params) =
        params.map_err(|rejection| ApiError::new(ErrorCode::ValidationError, rejection.body_text()))?;
    let mut query = params.to_query()?;
    query.order = ListOrder::MostRecentFirst;
    let listing = state.list_orders.execute(query).await?;
    Ok(Json(listing))
}

/// Get order endpoint.
async fn get_order<O>(
    State(state): State<AppState<O>>,
    Path(id): Path<String>,
) -> Result<Json<OrderDto>, ApiError>
where
    O: OrderRepository,
{
    let id = parse_order_id(&id)?;
    Ok(Json(state.get_order.execute(id).await?))
}

/// Complete order endpoint.
async fn complete_order<O>(
    State(state): State<AppState<O>>,
    Path(id): Path<String>,
) -> Result<Json<OrderStatusDto>, ApiError>
where
    O: OrderRepository,
{
    let id = parse_order_id(&id)?;
    Ok(Json(state.complete_order.execute(id).await?))
}

/// Delete order endpoint.
async fn delete_order<O>(
    State(state): State<AppState<O>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedOrderDto>, ApiError>
where
    O: OrderRepository,
{
    let id = parse_order_id(&id)?;
    Ok(Json(state.delete_order.execute(id).await?))
}
