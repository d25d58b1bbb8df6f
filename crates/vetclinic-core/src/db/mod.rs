//! Database layer for the clinic.

mod schema;
mod owners;
mod patients;
mod catalog;
mod clinical;
mod grooming;
mod lab_exams;
mod purchases;
mod invoices;
mod payments;
mod clinic;

pub use schema::*;
pub use catalog::*;
pub use grooming::*;
pub use invoices::*;
pub use payments::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::billing::BillingError;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Billing error: {0}")]
    Billing(#[from] BillingError),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened clinic database");
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction.
    pub fn transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}

/// Parse a stored currency label.
pub(crate) fn parse_currency(s: &str) -> DbResult<crate::money::Currency> {
    s.parse()
        .map_err(|e: crate::money::UnknownCurrency| DbError::Constraint(e.to_string()))
}
