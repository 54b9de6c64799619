//! `SQLite` store for the engine.
//!
//! One [`SqliteStore`] implements every backend trait over a single guarded
//! connection. The catalog tables defined here describe models, fields,
//! links, and permissions; record data lives in one dynamically created
//! table per model, and record links in one edge table per model link.
//!
//! ## Module Structure
//!
//! - [`connection`]: connection configuration and lock acquisition
//! - [`sql`]: identifier generation, value mapping, clause building
//! - [`metrics`]: operation count and latency recording
//! - `schema`, `records`, `links`, `permissions`: one file per backend trait

mod connection;
mod links;
mod metrics;
mod permissions;
mod records;
mod schema;
mod sql;

pub use connection::{acquire_lock, configure_connection};
pub use metrics::record_operation_metrics;
pub use sql::escape_like_wildcards;

use std::sync::Mutex;

use rusqlite::Connection;

use crate::config::{EngineConfig, StoreLocation};
use crate::{Error, Result};

/// `SQLite`-backed storage for models, records, links, and permissions.
///
/// All backend traits are implemented on this one type; an
/// `Arc<SqliteStore>` coerces to any of the backend trait objects the
/// services expect.
pub struct SqliteStore {
    /// Database connection (mutex for interior mutability).
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens a store as described by the config.
    ///
    /// For on-disk locations the parent directory is created when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or its catalog
    /// initialized.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let conn = match &config.location {
            StoreLocation::Disk(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).map_err(|e| Error::Integrity {
                            operation: "create_data_directory".to_string(),
                            source: Box::new(e),
                        })?;
                    }
                }
                Connection::open(path).map_err(|e| storage_error("open_database", e))?
            }
            StoreLocation::InMemory => {
                Connection::open_in_memory().map_err(|e| storage_error("open_database", e))?
            }
        };
        configure_connection(&conn, config.busy_timeout_ms);

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_catalog()?;
        Ok(store)
    }

    /// Opens an in-memory store, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        Self::open(&EngineConfig::in_memory())
    }

    pub(crate) const fn connection(&self) -> &Mutex<Connection> {
        &self.conn
    }

    /// Creates the catalog tables.
    fn initialize_catalog(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);

        conn.execute_batch(
            r"
            -- Model definitions
            CREATE TABLE IF NOT EXISTS models (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                owner TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Field definitions; one row per column of a model's record table
            CREATE TABLE IF NOT EXISTS fields (
                id TEXT PRIMARY KEY,
                model_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                field_type TEXT NOT NULL,
                is_parent INTEGER NOT NULL DEFAULT 0,
                is_required INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(model_id, name),
                FOREIGN KEY (model_id) REFERENCES models(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_fields_model ON fields(model_id);

            -- Link definitions; bound columns are NULL when unlimited
            CREATE TABLE IF NOT EXISTS model_links (
                id TEXT PRIMARY KEY,
                model_1_id TEXT NOT NULL,
                model_2_id TEXT NOT NULL,
                model1_unlimited INTEGER NOT NULL DEFAULT 1,
                model1_bound INTEGER,
                model2_unlimited INTEGER NOT NULL DEFAULT 1,
                model2_bound INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (model_1_id <> model_2_id),
                CHECK (model1_unlimited = 1 OR model1_bound IS NOT NULL),
                CHECK (model2_unlimited = 1 OR model2_bound IS NOT NULL),
                FOREIGN KEY (model_1_id) REFERENCES models(id),
                FOREIGN KEY (model_2_id) REFERENCES models(id)
            );

            -- At most one link per unordered model pair
            CREATE UNIQUE INDEX IF NOT EXISTS idx_model_links_pair
                ON model_links(MIN(model_1_id, model_2_id), MAX(model_1_id, model_2_id));

            CREATE INDEX IF NOT EXISTS idx_model_links_model_1 ON model_links(model_1_id);
            CREATE INDEX IF NOT EXISTS idx_model_links_model_2 ON model_links(model_2_id);

            -- Permission grants
            CREATE TABLE IF NOT EXISTS user_model_permissions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                model_id TEXT NOT NULL,
                permission TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, model_id, permission),
                FOREIGN KEY (model_id) REFERENCES models(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_permissions_user ON user_model_permissions(user_id);
            CREATE INDEX IF NOT EXISTS idx_permissions_model ON user_model_permissions(model_id);
            ",
        )
        .map_err(|e| storage_error("initialize_catalog", e))?;

        Ok(())
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

/// Wraps a driver error, logging it before the detail is hidden behind
/// [`Error::Integrity`].
pub(crate) fn storage_error(operation: &str, source: rusqlite::Error) -> Error {
    tracing::error!(operation, error = %source, "storage operation failed");
    Error::Integrity {
        operation: operation.to_string(),
        source: Box::new(source),
    }
}

/// Runs a closure inside an immediate transaction.
///
/// `BEGIN IMMEDIATE` takes the write lock up front so a multi-statement
/// operation never deadlocks against another writer mid-way. The
/// transaction commits when the closure returns `Ok` and rolls back on any
/// error.
pub(crate) fn in_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    conn.execute("BEGIN IMMEDIATE", [])
        .map_err(|e| storage_error("begin_transaction", e))?;
    match f(conn) {
        Ok(value) => {
            conn.execute("COMMIT", [])
                .map_err(|e| storage_error("commit_transaction", e))?;
            Ok(value)
        }
        Err(err) => {
            let _ = conn.execute("ROLLBACK", []);
            Err(err)
        }
    }
}
