//! SQLite persistence for products and payments.
//!
//! DAOs take a `&Connection` and never open, commit or roll back
//! transactions themselves. A `rusqlite::Transaction` derefs to a
//! `Connection`, so a step hands its transaction straight to a DAO and the
//! work joins that transaction.

pub mod metadata_dao;
pub mod payment_dao;
pub mod product_dao;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::Connection;
use tracing::debug;

pub use metadata_dao::ProductMetadataDao;
pub use payment_dao::PaymentDao;
pub use product_dao::ProductDao;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id        TEXT    NOT NULL UNIQUE,
    gateway_account_id INTEGER NOT NULL,
    name               TEXT    NOT NULL,
    description        TEXT,
    price              INTEGER NOT NULL,
    pay_api_token      TEXT    NOT NULL,
    return_url         TEXT,
    status             TEXT    NOT NULL,
    date_created       TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_gateway_account_id
    ON products (gateway_account_id);

CREATE TABLE IF NOT EXISTS payments (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id      TEXT    NOT NULL UNIQUE,
    govuk_payment_id TEXT,
    next_url         TEXT,
    status           TEXT    NOT NULL,
    product_id       INTEGER NOT NULL REFERENCES products (id),
    date_created     TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_payments_product_id
    ON payments (product_id);

CREATE TABLE IF NOT EXISTS product_metadata (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id     INTEGER NOT NULL REFERENCES products (id) ON DELETE CASCADE,
    metadata_key   TEXT    NOT NULL COLLATE NOCASE,
    metadata_value TEXT    NOT NULL,
    UNIQUE (product_id, metadata_key)
);
"#;

/// Handle to the products database file.
///
/// Each flow run opens its own connection, so concurrent runs never share
/// connection or transaction state.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create from the resolved configuration
    pub fn from_config(config: &crate::config::ResolvedConfig) -> Self {
        Self::new(config.database_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new connection with foreign keys enforced
    pub fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }

    /// Create the database file and schema if missing
    pub fn migrate(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = self
            .connect()
            .with_context(|| format!("Failed to open database: {}", self.path.display()))?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
            .context("Failed to enable WAL journal")?;
        create_schema(&conn).context("Failed to create schema")?;

        debug!(path = %self.path.display(), "Database migrated");
        Ok(())
    }

    /// Check the database answers a trivial query
    pub fn health_check(&self) -> rusqlite::Result<()> {
        let conn = self.connect()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

/// Create all tables and indexes on an open connection
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Parse a text column into a typed value, reporting the column on failure
pub(crate) fn parse_column<T>(index: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}
