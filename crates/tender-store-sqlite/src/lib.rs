//! SQLite backend for the tender consistency engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Addendum application runs as a single
//! SQLite transaction.

mod encode;
mod mutator;
mod queries;
mod schema;
mod store;
mod versions;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
