use std::time::Duration;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::schema::initialize_schema;

/// Connection settings for the directory database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Path to the SQLite database file; `None` opens a private in-memory database
    pub db_path: Option<String>,
    /// How long a statement waits on a locked database before failing
    pub busy_timeout_ms: u64,
    /// Create the tables when opening
    pub initialize_schema: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: 5_000,
            initialize_schema: true,
        }
    }
}

impl DirectoryConfig {
    /// File-backed config with default settings
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: Some(db_path.into()),
            ..Self::default()
        }
    }

    /// Private in-memory database with default settings
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a connection with foreign keys enforced, initializing the schema
    /// when configured to.
    pub fn open(&self) -> Result<Connection> {
        let conn = match &self.db_path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        info!(
            path = self.db_path.as_deref().unwrap_or(":memory:"),
            "opened client directory database"
        );
        conn.busy_timeout(Duration::from_millis(self.busy_timeout_ms))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        if self.initialize_schema {
            initialize_schema(&conn)?;
        }
        Ok(conn)
    }
}
