//! Order store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::infrastructure::persistence::RepairPolicy;

/// Order store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database file. Its parent directory is created on startup.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// How long a statement waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
    /// Schema repair policy applied at startup.
    #[serde(default)]
    pub repair_policy: RepairPolicy,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            busy_timeout_ms: default_busy_timeout(),
            repair_policy: RepairPolicy::default(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/orders.db")
}

const fn default_busy_timeout() -> u64 {
    5_000
}
