//! SQLite backend for Event Hub.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod audit;
mod directory;
mod encode;
mod schema;
mod seed;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use seed::SeedReport;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
