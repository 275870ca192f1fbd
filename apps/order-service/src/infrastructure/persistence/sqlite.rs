//! SQLite order repository.
//!
//! One connection is shared behind a mutex and every call runs on the
//! blocking pool, so the async runtime never waits on disk I/O. SQLite
//! serializes writers; the mutex makes that explicit for this process and
//! `busy_timeout` covers other processes holding the file.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info, warn};

use super::schema::{SchemaError, SchemaManager, SchemaReport};
use crate::config::PersistenceConfig;
use crate::domain::orders::aggregate::{decode_items, encode_items};
use crate::domain::orders::{
    ExcludedRecord, ListOrder, ListQuery, NewOrder, Order, OrderError, OrderId, OrderListing,
    OrderRepository, OrderStatus, OrderTotal, PlacedOrder,
};

const SELECT_ORDER: &str = "SELECT id, name, phone, location, items, total, status, created_at, idempotency_key FROM orders";

/// `OrderRepository` backed by a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteOrderRepository {
    /// Open the database file, creating its directory if needed, and verify
    /// the schema.
    ///
    /// The repository is only handed out once the schema is usable.
    pub fn open(config: &PersistenceConfig) -> Result<(Self, SchemaReport), SchemaError> {
        let conn = open_connection(config)?;
        Self::from_connection(conn, SchemaManager::new(config.repair_policy))
    }

    /// Drop and recreate the orders table in the configured database file.
    ///
    /// Operator procedure; returns the number of discarded orders.
    pub fn rebuild_schema(config: &PersistenceConfig) -> Result<i64, SchemaError> {
        let mut conn = open_connection(config)?;
        SchemaManager::new(config.repair_policy).rebuild(&mut conn)
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self, SchemaError> {
        let conn = Connection::open_in_memory().map_err(|source| SchemaError::Database {
            context: "opening in-memory database",
            source,
        })?;
        Self::from_connection(conn, SchemaManager::default()).map(|(repo, _)| repo)
    }

    /// Open a database file at `path` with default options.
    pub fn open_path(path: impl AsRef<Path>) -> Result<(Self, SchemaReport), SchemaError> {
        Self::open(&PersistenceConfig {
            db_path: path.as_ref().to_path_buf(),
            ..PersistenceConfig::default()
        })
    }

    fn from_connection(
        mut conn: Connection,
        schema: SchemaManager,
    ) -> Result<(Self, SchemaReport), SchemaError> {
        let report = schema.ensure_schema(&mut conn)?;
        if !report.is_unchanged() {
            info!(
                created = report.created,
                rebuilt = report.rebuilt,
                added_columns = ?report.added_columns,
                backfilled_rows = report.backfilled_rows,
                "Repaired orders schema"
            );
        }

        Ok((
            Self {
                conn: Arc::new(Mutex::new(conn)),
            },
            report,
        ))
    }

    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> Result<T, OrderError>
    where
        F: FnOnce(&mut Connection) -> Result<T, OrderError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| OrderError::storage(operation, e))?
    }
}

fn open_connection(config: &PersistenceConfig) -> Result<Connection, SchemaError> {
    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SchemaError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let conn = Connection::open(&config.db_path).map_err(|source| SchemaError::Database {
        context: "opening database",
        source,
    })?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|source| SchemaError::Database {
            context: "setting busy timeout",
            source,
        })?;
    let journal_mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(|source| SchemaError::Database {
            context: "enabling WAL journal",
            source,
        })?;
    info!(path = %config.db_path.display(), journal_mode, "Opened order database");

    Ok(conn)
}

/// A row as stored, before any decoding.
struct StoredRow {
    id: i64,
    name: Value,
    phone: Value,
    location: Value,
    items: Value,
    total: Value,
    status: Value,
    created_at: Value,
    idempotency_key: Value,
}

impl StoredRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            location: row.get(3)?,
            items: row.get(4)?,
            total: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
            idempotency_key: row.get(8)?,
        })
    }

    fn decode(self) -> Result<Order, OrderError> {
        let id = OrderId::new(self.id);

        let items_raw = text(id, "items", self.items)?;
        let items = decode_items(&items_raw).map_err(|e| corrupt(id, "items", e))?;

        let total_raw = match self.total {
            Value::Text(s) => s,
            Value::Integer(n) => n.to_string(),
            Value::Real(f) => f.to_string(),
            other => return Err(corrupt(id, "total", unexpected(&other))),
        };
        let total = OrderTotal::parse(&total_raw).map_err(|e| corrupt(id, "total", e))?;

        // Rows written before the column existed read as pending.
        let status = match self.status {
            Value::Null => OrderStatus::Pending,
            Value::Text(s) => s
                .parse::<OrderStatus>()
                .map_err(|e| corrupt(id, "status", e))?,
            other => return Err(corrupt(id, "status", unexpected(&other))),
        };

        let created_raw = text(id, "created_at", self.created_at)?;
        let created_at =
            parse_timestamp(&created_raw).map_err(|e| corrupt(id, "created_at", e))?;

        let idempotency_key = match self.idempotency_key {
            Value::Null => None,
            Value::Text(s) => Some(s),
            other => return Err(corrupt(id, "idempotency_key", unexpected(&other))),
        };

        Ok(Order {
            id,
            name: text(id, "name", self.name)?,
            phone: text(id, "phone", self.phone)?,
            location: text(id, "location", self.location)?,
            items,
            total,
            status,
            created_at,
            idempotency_key,
        })
    }
}

fn corrupt(order_id: OrderId, field: &'static str, reason: impl ToString) -> OrderError {
    OrderError::DataCorruption {
        order_id,
        field,
        reason: reason.to_string(),
    }
}

fn unexpected(value: &Value) -> String {
    format!("unexpected {:?} value", value.data_type())
}

fn text(order_id: OrderId, field: &'static str, value: Value) -> Result<String, OrderError> {
    match value {
        Value::Text(s) => Ok(s),
        Value::Null => Err(corrupt(order_id, field, "value is NULL")),
        other => Err(corrupt(order_id, field, unexpected(&other))),
    }
}

/// Parse SQLite `CURRENT_TIMESTAMP` text (UTC, `YYYY-MM-DD HH:MM:SS`), with
/// optional fractional seconds, or RFC 3339.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
}

fn list_sql(query: ListQuery) -> String {
    let mut sql = String::from(SELECT_ORDER);
    if query.status.is_some() {
        // Same normalization as `OrderStatus::from_str` applies when decoding.
        sql.push_str(" WHERE LOWER(TRIM(COALESCE(status, 'pending'), ' ' || char(9, 10, 13))) = ?1");
    }
    sql.push_str(match query.order {
        ListOrder::Insertion => " ORDER BY id ASC",
        ListOrder::MostRecentFirst => " ORDER BY created_at DESC, id DESC",
    });
    sql
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<PlacedOrder, OrderError> {
        let items = encode_items(order.items()).map_err(|e| OrderError::storage("create", e))?;

        self.with_conn("create", move |conn| {
            let db = |e: rusqlite::Error| OrderError::storage("create", e);
            let tx = conn.transaction().map_err(db)?;

            if let Some(key) = order.idempotency_key() {
                let existing: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM orders WHERE idempotency_key = ?1",
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(db)?;
                if let Some(id) = existing {
                    debug!(order_id = id, idempotency_key = key, "Replayed order creation");
                    return Ok(PlacedOrder::replayed(OrderId::new(id)));
                }
            }

            tx.execute(
                "INSERT INTO orders (name, phone, location, items, total, status, created_at, idempotency_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'pending', CURRENT_TIMESTAMP, ?6)",
                params![
                    order.name(),
                    order.phone(),
                    order.location(),
                    items,
                    order.total().to_storage(),
                    order.idempotency_key(),
                ],
            )
            .map_err(db)?;
            let id = tx.last_insert_rowid();
            tx.commit().map_err(db)?;

            debug!(order_id = id, "Inserted order");
            Ok(PlacedOrder::inserted(OrderId::new(id)))
        })
        .await
    }

    async fn list(&self, query: ListQuery) -> Result<OrderListing, OrderError> {
        self.with_conn("list", move |conn| {
            let db = |e: rusqlite::Error| OrderError::storage("list", e);
            let mut stmt = conn.prepare(&list_sql(query)).map_err(db)?;

            let rows = match query.status {
                Some(status) => stmt
                    .query_map(params![status.as_str()], StoredRow::read)
                    .map_err(db)?
                    .collect::<Result<Vec<_>, _>>(),
                None => stmt
                    .query_map([], StoredRow::read)
                    .map_err(db)?
                    .collect::<Result<Vec<_>, _>>(),
            }
            .map_err(db)?;

            let mut listing = OrderListing::default();
            for row in rows {
                match row.decode() {
                    Ok(order) => listing.orders.push(order),
                    Err(err) => {
                        warn!(error = %err, "Excluding undecodable order from listing");
                        if let Some(record) = ExcludedRecord::from_error(&err) {
                            listing.excluded.push(record);
                        }
                    }
                }
            }
            Ok(listing)
        })
        .await
    }

    async fn find(&self, id: OrderId) -> Result<Order, OrderError> {
        self.with_conn("find", move |conn| {
            let row = conn
                .query_row(
                    &format!("{SELECT_ORDER} WHERE id = ?1"),
                    params![id.value()],
                    StoredRow::read,
                )
                .optional()
                .map_err(|e| OrderError::storage("find", e))?;

            row.ok_or(OrderError::NotFound { order_id: id })?.decode()
        })
        .await
    }

    async fn complete(&self, id: OrderId) -> Result<(), OrderError> {
        self.with_conn("complete", move |conn| {
            let changed = conn
                .execute(
                    "UPDATE orders SET status = 'completed' WHERE id = ?1",
                    params![id.value()],
                )
                .map_err(|e| OrderError::storage("complete", e))?;
            if changed == 0 {
                return Err(OrderError::NotFound { order_id: id });
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: OrderId) -> Result<(), OrderError> {
        self.with_conn("delete", move |conn| {
            let changed = conn
                .execute("DELETE FROM orders WHERE id = ?1", params![id.value()])
                .map_err(|e| OrderError::storage("delete", e))?;
            if changed == 0 {
                return Err(OrderError::NotFound { order_id: id });
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orders::{CreateOrderCommand, LineItem};
    use serde_json::json;

    fn new_order(name: &str) -> NewOrder {
        NewOrder::new(CreateOrderCommand {
            name: Some(json!(name)),
            phone: Some(json!("555")),
            location: Some(json!("Main St")),
            items: Some(json!([{"product": "Widget", "qty": 2}])),
            total: Some(json!("19.98")),
            idempotency_key: None,
        })
        .unwrap()
    }

    fn keyed_order(key: &str) -> NewOrder {
        NewOrder::new(CreateOrderCommand {
            name: Some(json!("Ana")),
            phone: Some(json!("555")),
            location: Some(json!("Main St")),
            items: Some(json!([{"product": "Widget", "qty": 1}])),
            total: Some(json!("9.99")),
            idempotency_key: Some(json!(key)),
        })
        .unwrap()
    }

    fn raw_exec(repo: &SqliteOrderRepository, sql: &str) {
        repo.conn.lock().execute_batch(sql).unwrap();
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids_and_defaults() {
        let repo = SqliteOrderRepository::open_in_memory().unwrap();
        let a = repo.create(new_order("Ana")).await.unwrap().id;
        let b = repo.create(new_order("Ben")).await.unwrap().id;
        assert_ne!(a, b);

        let order = repo.find(a).await.unwrap();
        assert_eq!(order.name, "Ana");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items, vec![LineItem::new("Widget", 2)]);
        assert_eq!(order.total.to_storage(), "19.98");
    }

    #[tokio::test]
    async fn idempotent_create_returns_existing_id() {
        let repo = SqliteOrderRepository::open_in_memory().unwrap();
        let first = repo.create(keyed_order("retry-1")).await.unwrap().id;
        let second = repo.create(keyed_order("retry-1")).await.unwrap();
        assert!(second.replayed);
        assert_eq!(first, second.id);
        assert_eq!(repo.list(ListQuery::all()).await.unwrap().len(), 1);

        let other = repo.create(keyed_order("retry-2")).await.unwrap().id;
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn complete_is_idempotent_and_missing_is_not_found() {
        let repo = SqliteOrderRepository::open_in_memory().unwrap();
        let id = repo.create(new_order("Ana")).await.unwrap().id;

        repo.complete(id).await.unwrap();
        repo.complete(id).await.unwrap();
        assert_eq!(repo.find(id).await.unwrap().status, OrderStatus::Completed);

        let err = repo.complete(OrderId::new(999)).await.unwrap_err();
        assert_eq!(
            err,
            OrderError::NotFound {
                order_id: OrderId::new(999)
            }
        );
    }

    #[tokio::test]
    async fn delete_is_final() {
        let repo = SqliteOrderRepository::open_in_memory().unwrap();
        let id = repo.create(new_order("Ana")).await.unwrap().id;

        repo.delete(id).await.unwrap();
        assert!(matches!(repo.find(id).await, Err(OrderError::NotFound { .. })));
        assert!(matches!(repo.delete(id).await, Err(OrderError::NotFound { .. })));
        assert!(matches!(repo.complete(id).await, Err(OrderError::NotFound { .. })));
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let repo = SqliteOrderRepository::open_in_memory().unwrap();
        let a = repo.create(new_order("Ana")).await.unwrap().id;
        let b = repo.create(new_order("Ben")).await.unwrap().id;
        repo.complete(b).await.unwrap();

        let pending = repo
            .list(ListQuery::all().with_status(OrderStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![a]);

        let completed = repo
            .list(ListQuery::all().with_status(OrderStatus::Completed))
            .await
            .unwrap();
        assert_eq!(completed.orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![b]);
    }

    #[tokio::test]
    async fn null_status_reads_as_pending() {
        let repo = SqliteOrderRepository::open_in_memory().unwrap();
        let id = repo.create(new_order("Ana")).await.unwrap().id;
        raw_exec(&repo, "UPDATE orders SET status = NULL");

        assert_eq!(repo.find(id).await.unwrap().status, OrderStatus::Pending);
        let pending = repo
            .list(ListQuery::all().with_status(OrderStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn status_filter_matches_decoded_status() {
        let repo = SqliteOrderRepository::open_in_memory().unwrap();
        let a = repo.create(new_order("Ana")).await.unwrap().id;
        let b = repo.create(new_order("Ben")).await.unwrap().id;
        raw_exec(
            &repo,
            &format!("UPDATE orders SET status = ' Completed ' WHERE id = {}", a.value()),
        );
        raw_exec(
            &repo,
            &format!("UPDATE orders SET status = 'PENDING' WHERE id = {}", b.value()),
        );

        let all = repo.list(ListQuery::all()).await.unwrap();
        assert_eq!(all.orders[0].status, OrderStatus::Completed);

        let completed = repo
            .list(ListQuery::all().with_status(OrderStatus::Completed))
            .await
            .unwrap();
        assert_eq!(completed.orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![a]);

        let pending = repo
            .list(ListQuery::all().with_status(OrderStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![b]);
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let repo = SqliteOrderRepository::open_in_memory().unwrap();
        let a = repo.create(new_order("Ana")).await.unwrap().id;
        let b = repo.create(new_order("Ben")).await.unwrap().id;
        let c = repo.create(new_order("Cid")).await.unwrap().id;
        raw_exec(
            &repo,
            &format!(
                "UPDATE orders SET created_at = '2024-01-01 10:00:00' WHERE id = {};
                 UPDATE orders SET created_at = '2024-03-01 10:00:00' WHERE id = {};
                 UPDATE orders SET created_at = '2024-03-01 10:00:00' WHERE id = {};",
                a.value(),
                b.value(),
                c.value()
            ),
        );

        let history = repo.list(ListQuery::history()).await.unwrap();
        let ids: Vec<_> = history.orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![c, b, a]);
    }

    #[tokio::test]
    async fn corrupt_record_is_excluded_not_fatal() {
        let repo = SqliteOrderRepository::open_in_memory().unwrap();
        let good = repo.create(new_order("Ana")).await.unwrap().id;
        let bad = repo.create(new_order("Ben")).await.unwrap().id;
        raw_exec(
            &repo,
            &format!("UPDATE orders SET items = 'not json' WHERE id = {}", bad.value()),
        );

        let listing = repo.list(ListQuery::all()).await.unwrap();
        assert_eq!(listing.orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![good]);
        assert_eq!(listing.excluded.len(), 1);
        assert_eq!(listing.excluded[0].id, bad);
        assert_eq!(listing.excluded[0].field, "items");

        assert!(matches!(
            repo.find(bad).await,
            Err(OrderError::DataCorruption { field: "items", .. })
        ));
    }

    #[tokio::test]
    async fn null_items_is_corruption() {
        let repo = SqliteOrderRepository::open_in_memory().unwrap();
        // Legacy tables had no NOT NULL constraints.
        raw_exec(
            &repo,
            "DROP TABLE orders;
             CREATE TABLE orders (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, phone TEXT, location TEXT,
                                  items TEXT, total TEXT, status TEXT DEFAULT 'pending',
                                  created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, idempotency_key TEXT);
             INSERT INTO orders (name, phone, location, items, total) VALUES ('Ben', '556', 'High St', NULL, '2');",
        );

        let listing = repo.list(ListQuery::all()).await.unwrap();
        assert!(listing.is_empty());
        assert_eq!(listing.excluded[0].field, "items");
    }

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let plain = parse_timestamp("2024-05-01 12:30:00").unwrap();
        assert_eq!(plain.to_rfc3339(), "2024-05-01T12:30:00+00:00");
        assert!(parse_timestamp("2024-05-01 12:30:00.250").is_ok());
        assert!(parse_timestamp("2024-05-01T12:30:00Z").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
