//! Storage errors

use thiserror::Error;

/// Storage operation error
#[derive(Debug, Error)]
pub enum StorageError {
    /// RocksDB error
    #[error("rocksdb error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Database not open
    #[error("database is not open")]
    NotOpen,

    /// Database already open
    #[error("database is already open")]
    AlreadyOpen,

    /// Unknown column family
    #[error("invalid column family: {0}")]
    InvalidColumnFamily(String),

    /// Key not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Stored bytes failed to decode
    #[error("corrupt record under key {0}")]
    Corrupt(String),
}

/// Storage result alias
pub type StorageResult<T> = Result<T, StorageError>;
