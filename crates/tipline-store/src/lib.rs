#![forbid(unsafe_code)]
//! Durable state for the tipline platform: users (the entitlement store),
//! plans, the append-only payment audit trail, tips, notifications, and
//! login history.
//!
//! One rusqlite connection behind an async mutex. Every public method is a
//! single read-modify-write at the granularity of one row or one batch,
//! which is the atomicity the concurrency model asks for.

use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tokio::sync::Mutex;

mod logins;
mod notifications;
mod payments;
mod plans;
mod schema;
mod tips;
mod users;

pub use logins::LoginRecord;
pub use users::SubscriberSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced row does not exist.
    NotFound(String),
    /// Anything sqlite reports; never surfaced verbatim across the trust
    /// boundary.
    Storage(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(schema::SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

pub(crate) mod time {
    use chrono::{DateTime, TimeZone, Utc};

    pub fn to_millis(at: DateTime<Utc>) -> i64 {
        at.timestamp_millis()
    }

    pub fn from_millis(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

pub(crate) fn parse_col<T, E>(
    idx: usize,
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    parse(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
