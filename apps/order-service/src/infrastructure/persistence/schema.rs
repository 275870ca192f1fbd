//! Schema verification and repair for the `orders` table.
//!
//! Runs once at startup, before the repository accepts any call. The table is
//! inspected with `PRAGMA table_info` and compared with the expected layout:
//!
//! - **Required columns** (`id`, `name`, `phone`, `location`, `items`,
//!   `total`) carry order data. If any is missing the table cannot be used.
//! - **Optional columns** (`status`, `created_at`, `idempotency_key`) were
//!   added over time and are repaired in place with `ALTER TABLE ... ADD
//!   COLUMN`, keeping every existing row.
//!
//! A missing required column is fatal under [`RepairPolicy::Additive`]. Only
//! the operator opt-in [`RepairPolicy::Destructive`] drops and recreates the
//! table, and it always logs how many rows were discarded.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Name of the backing table.
pub const ORDERS_TABLE: &str = "orders";

/// Columns without which stored orders are meaningless.
pub const REQUIRED_COLUMNS: [&str; 6] = ["id", "name", "phone", "location", "items", "total"];

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS orders (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    phone           TEXT NOT NULL,
    location        TEXT NOT NULL,
    items           TEXT NOT NULL,
    total           TEXT NOT NULL,
    status          TEXT DEFAULT 'pending',
    created_at      TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    idempotency_key TEXT
)";

const CREATE_INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
    CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_idempotency_key ON orders(idempotency_key);
";

/// A column that can be added to an existing table without losing rows.
struct OptionalColumn {
    name: &'static str,
    add: &'static str,
}

// SQLite cannot ADD COLUMN with a non-constant default, so `created_at` is
// added bare; inserts always set it explicitly.
const OPTIONAL_COLUMNS: [OptionalColumn; 3] = [
    OptionalColumn {
        name: "status",
        add: "ALTER TABLE orders ADD COLUMN status TEXT DEFAULT 'pending'",
    },
    OptionalColumn {
        name: "created_at",
        add: "ALTER TABLE orders ADD COLUMN created_at TIMESTAMP",
    },
    OptionalColumn {
        name: "idempotency_key",
        add: "ALTER TABLE orders ADD COLUMN idempotency_key TEXT",
    },
];

// Rows from a bare `created_at` column, or written with an explicit NULL,
// get the repair time. Runs on every start.
const BACKFILL_CREATED_AT: &str =
    "UPDATE orders SET created_at = CURRENT_TIMESTAMP WHERE created_at IS NULL";

/// What to do when a required column is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairPolicy {
    /// Add missing optional columns; refuse to start on missing required ones.
    #[default]
    Additive,
    /// Also drop and recreate the table when required columns are missing.
    /// Discards every stored order.
    Destructive,
}

impl fmt::Display for RepairPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Additive => f.write_str("additive"),
            Self::Destructive => f.write_str("destructive"),
        }
    }
}

impl FromStr for RepairPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "additive" => Ok(Self::Additive),
            "destructive" => Ok(Self::Destructive),
            other => Err(format!(
                "unknown repair policy '{other}' (expected 'additive' or 'destructive')"
            )),
        }
    }
}

/// Errors from schema verification. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// SQLite failed.
    #[error("database error while {context}: {source}")]
    Database {
        /// What was being done.
        context: &'static str,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// Required columns are missing and the policy forbids rebuilding.
    #[error(
        "orders table is missing required columns [{}]; refusing to start. \
         Rebuilding would discard {row_count} stored orders and requires the 'destructive' repair policy",
        .missing.join(", ")
    )]
    MissingRequiredColumns {
        /// Missing column names.
        missing: Vec<String>,
        /// Rows currently in the table.
        row_count: i64,
    },

    /// The data directory could not be created.
    #[error("cannot prepare data directory '{}': {source}", .path.display())]
    Io {
        /// Directory path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

fn db(context: &'static str) -> impl FnOnce(rusqlite::Error) -> SchemaError {
    move |source| SchemaError::Database { context, source }
}

/// Outcome of [`SchemaManager::ensure_schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// The table did not exist and was created.
    pub created: bool,
    /// Optional columns added in place.
    pub added_columns: Vec<&'static str>,
    /// The table was dropped and recreated.
    pub rebuilt: bool,
    /// Rows discarded by a rebuild.
    pub discarded_rows: i64,
    /// Rows whose missing `created_at` was set to the repair time.
    pub backfilled_rows: usize,
    /// Columns present in the table but unknown to this service.
    pub unexpected_columns: Vec<String>,
}

impl SchemaReport {
    /// True if the table already matched and nothing was changed.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        !self.created
            && !self.rebuilt
            && self.added_columns.is_empty()
            && self.backfilled_rows == 0
    }
}

/// Verifies and repairs the `orders` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaManager {
    policy: RepairPolicy,
}

impl SchemaManager {
    /// Create a manager with the given repair policy.
    #[must_use]
    pub const fn new(policy: RepairPolicy) -> Self {
        Self { policy }
    }

    /// Make sure the table exists with every expected column.
    ///
    /// Idempotent. Runs in a single transaction: either the whole repair
    /// applies or nothing changes.
    pub fn ensure_schema(&self, conn: &mut Connection) -> Result<SchemaReport, SchemaError> {
        let tx = conn
            .transaction()
            .map_err(db("starting schema transaction"))?;
        let columns = table_columns(&tx)?;
        let mut report = SchemaReport::default();

        if columns.is_empty() {
            tx.execute_batch(CREATE_TABLE)
                .map_err(db("creating orders table"))?;
            report.created = true;
            info!(table = ORDERS_TABLE, "Created orders table");
        } else {
            let missing: Vec<String> = REQUIRED_COLUMNS
                .iter()
                .filter(|required| !columns.iter().any(|c| c == *required))
                .map(|c| (*c).to_string())
                .collect();

            if missing.is_empty() {
                for column in &OPTIONAL_COLUMNS {
                    if columns.iter().any(|c| c == column.name) {
                        continue;
                    }
                    tx.execute_batch(column.add)
                        .map_err(db("adding optional column"))?;
                    info!(column = column.name, "Added missing optional column to orders table");
                    report.added_columns.push(column.name);
                }

                report.backfilled_rows = tx
                    .execute(BACKFILL_CREATED_AT, [])
                    .map_err(db("back-filling created_at"))?;
                if report.backfilled_rows > 0 {
                    warn!(
                        rows = report.backfilled_rows,
                        "Orders without created_at were stamped with the current time"
                    );
                }

                report.unexpected_columns = columns
                    .iter()
                    .filter(|c| {
                        !REQUIRED_COLUMNS.contains(&c.as_str())
                            && !OPTIONAL_COLUMNS.iter().any(|o| o.name == c.as_str())
                    })
                    .cloned()
                    .collect();
                if !report.unexpected_columns.is_empty() {
                    warn!(
                        columns = ?report.unexpected_columns,
                        "orders table has columns this service does not use; leaving them in place"
                    );
                }

                if !has_autoincrement(&tx)? {
                    warn!(
                        "orders table was created without AUTOINCREMENT; ids of deleted newest orders may be reused"
                    );
                }
            } else {
                let row_count = count_rows(&tx)?;
                if self.policy == RepairPolicy::Additive {
                    return Err(SchemaError::MissingRequiredColumns { missing, row_count });
                }

                warn!(
                    missing = ?missing,
                    discarded_rows = row_count,
                    "orders table is missing required columns; destructive repair policy set, dropping and recreating it"
                );
                recreate(&tx)?;
                report.rebuilt = true;
                report.discarded_rows = row_count;
            }
        }

        tx.execute_batch(CREATE_INDEXES)
            .map_err(db("creating orders indexes"))?;
        tx.commit().map_err(db("committing schema changes"))?;

        Ok(report)
    }

    /// Drop and recreate the table regardless of its current shape.
    ///
    /// Operator-invoked. Returns the number of discarded rows.
    pub fn rebuild(&self, conn: &mut Connection) -> Result<i64, SchemaError> {
        let tx = conn
            .transaction()
            .map_err(db("starting rebuild transaction"))?;
        let row_count = if table_columns(&tx)?.is_empty() {
            0
        } else {
            count_rows(&tx)?
        };

        warn!(
            discarded_rows = row_count,
            "Rebuilding orders table on operator request; all stored orders are discarded"
        );
        recreate(&tx)?;
        tx.execute_batch(CREATE_INDEXES)
            .map_err(db("creating orders indexes"))?;
        tx.commit().map_err(db("committing rebuild"))?;

        Ok(row_count)
    }
}

/// Column names of the `orders` table, empty if the table does not exist.
pub fn table_columns(conn: &Connection) -> Result<Vec<String>, SchemaError> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(orders)")
        .map_err(db("inspecting orders table"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(db("inspecting orders table"))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(db("inspecting orders table"))?;
    Ok(names)
}

fn count_rows(conn: &Connection) -> Result<i64, SchemaError> {
    conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
        .map_err(db("counting orders"))
}

fn has_autoincrement(conn: &Connection) -> Result<bool, SchemaError> {
    let sql: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'orders'",
            [],
            |row| row.get(0),
        )
        .map_err(db("reading orders table definition"))?;
    Ok(sql.is_some_and(|s| s.to_ascii_uppercase().contains("AUTOINCREMENT")))
}

fn recreate(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch("DROP TABLE IF EXISTS orders")
        .map_err(db("dropping orders table"))?;
    conn.execute_batch(CREATE_TABLE)
        .map_err(db("creating orders table"))
}
