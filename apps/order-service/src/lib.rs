// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Order Service - Rust Core Library
//!
//! HTTP backend for an online ordering workflow: customers place orders, staff
//! list them, mark them completed and delete them.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects, repository port)
//!   - `orders`: Order aggregate, line items, status lifecycle, validation
//!
//! - **Application**: Use cases and orchestration
//!   - `use_cases`: `PlaceOrder`, `ListOrders`, `GetOrder`, `CompleteOrder`, `DeleteOrder`
//!   - `dto`: Data transfer objects for API boundaries
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: SQLite repository with startup schema repair, in-memory repository
//!   - `http`: axum REST controller
//!
//! Cross-cutting: `config` (YAML + environment), `error` (HTTP error codes),
//! `telemetry` (tracing subscriber).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and DTOs.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// HTTP error codes and response mapping.
pub mod error;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::orders::{
    CreateOrderCommand, LineItem, NewOrder, Order, OrderError, OrderId, OrderRepository,
    OrderStatus, OrderTotal,
};

// Application re-exports
pub use application::dto::{OrderDto, OrderListDto};
pub use application::use_cases::{
    CompleteOrderUseCase, DeleteOrderUseCase, GetOrderUseCase, ListOrdersUseCase,
    PlaceOrderUseCase,
};

// Infrastructure re-exports
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::persistence::{
    InMemoryOrderRepository, RepairPolicy, SchemaError, SchemaManager, SchemaReport,
    SqliteOrderRepository,
};

pub use config::{Config, ConfigError};
pub use error::{ApiError, ErrorCode};
