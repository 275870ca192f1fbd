//! Persistence Adapters
//!
//! Database implementations of repository traits.

pub mod in_memory;
pub mod schema;
pub mod sqlite;

pub use in_memory::InMemoryOrderRepository;
pub use schema::{RepairPolicy, SchemaError, SchemaManager, SchemaReport};
pub use sqlite::SqliteOrderRepository;
