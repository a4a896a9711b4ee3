//! The behaviour contracts for gophermart storage backends.
//!
//! The engine is written against these traits rather than a concrete database so that the HTTP layer and the
//! scheduler can be exercised against mocks. [`crate::SqliteDatabase`] is the production implementation.
mod ledger;

pub use ledger::{LedgerDatabase, LedgerError};
