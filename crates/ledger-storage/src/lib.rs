//! # ledger-storage
//!
//! Persistent key-value storage: a RocksDB-backed `Database`, an in-memory
//! `MemoryStore` for tests and fault injection, the `KvStore` seam between
//! them, and the ledger key scheme.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod db;
mod error;
pub mod keys;
mod memory;
mod traits;

pub use db::{Database, DbConfig};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use traits::{BatchOp, KvStore, WriteBatch};
