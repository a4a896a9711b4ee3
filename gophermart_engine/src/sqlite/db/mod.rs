//! Low-level SQLite query functions.
//!
//! All interactions are plain async functions that accept a `&mut SqliteConnection`. Callers obtain a connection
//! from the pool, or open a transaction and pass `&mut *tx`, so any of these calls can be composed atomically
//! without further changes.
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod orders;
pub mod users;
pub mod withdrawals;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// True when the error is a violation of a UNIQUE constraint.
pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if db.is_unique_violation())
}

/// True when the error is a violation of a CHECK constraint (e.g. a balance dropping below zero).
pub(crate) fn is_check_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if db.kind() == sqlx::error::ErrorKind::CheckViolation)
}
