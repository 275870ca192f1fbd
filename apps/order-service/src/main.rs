//! Order Service Binary
//!
//! Verifies the order store schema, then serves the REST API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-service
//! cargo run --bin order-service -- rebuild-schema   # destructive, operator only
//! ```
//!
//! # Environment Variables
//!
//! - `ORDER_SERVICE_CONFIG`: YAML config path (default: `config.yaml` if present)
//! - `PORT`: HTTP port (default: 3000)
//! - `BIND_ADDRESS`: Bind address (default: 0.0.0.0)
//! - `ORDERS_DB_PATH`: SQLite file (default: ./data/orders.db)
//! - `ORDERS_REPAIR_POLICY`: `additive` | `destructive` (default: additive)
//! - `LOG_FORMAT`: `pretty` | `json` (default: json)
//! - `RUST_LOG`: Log filter (default: info)

use std::sync::Arc;

use anyhow::Context;
use order_service::config::Config;
use order_service::infrastructure::http::{AppState, create_router};
use order_service::infrastructure::persistence::SqliteOrderRepository;
use order_service::telemetry::init_tracing;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.observability.logging).context("failed to initialize tracing")?;

    if std::env::args().nth(1).as_deref() == Some("rebuild-schema") {
        return rebuild_schema(&config);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        db_path = %config.persistence.db_path.display(),
        repair_policy = %config.persistence.repair_policy,
        "Starting order service"
    );

    // The schema must be usable before the listener binds.
    let (repo, report) = SqliteOrderRepository::open(&config.persistence)
        .context("order store schema check failed")?;
    if report.rebuilt {
        tracing::warn!(
            discarded_rows = report.discarded_rows,
            "Orders table was rebuilt at startup"
        );
    }

    let state = AppState::new(Arc::new(repo), env!("CARGO_PKG_VERSION"));
    let app = create_router(state, &config.server);

    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "HTTP server starting");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health");
    tracing::info!("  POST   /order");
    tracing::info!("  GET    /orders[?status=pending|completed&view=history]");
    tracing::info!("  GET    /orders/history");
    tracing::info!("  GET    /orders/{{id}}");
    tracing::info!("  POST   /orders/{{id}}/complete");
    tracing::info!("  DELETE /orders/{{id}}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Order service stopped");
    Ok(())
}

/// Operator procedure: drop and recreate the orders table.
fn rebuild_schema(config: &Config) -> anyhow::Result<()> {
    let discarded = SqliteOrderRepository::rebuild_schema(&config.persistence)
        .context("schema rebuild failed")?;
    tracing::warn!(discarded_rows = discarded, "Orders table rebuilt");
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
