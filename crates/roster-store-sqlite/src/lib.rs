//! SQLite backend for the Roster store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every call is a closure executed on
//! that thread, so calls on one [`SqliteStore`] are serialized.

mod encode;
mod reconcile;
mod schema;
mod seed;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use seed::SeedSummary;
pub use store::SqliteStore;
