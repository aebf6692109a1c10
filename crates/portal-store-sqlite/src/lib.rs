//! SQLite backend for the health portal tables.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Implements
//! [`portal_core::TableStore`] over the `profiles`, `appointments` and
//! `health_checks` schema.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
