//! SingleTab Storage Layer
//!
//! SQLite-backed key-value items, partitioned by origin.
//! Every read-modify-write on a single item runs in one transaction.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
