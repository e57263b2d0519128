//! Key-value store seam shared by the RocksDB database and the in-memory
//! test store.

use crate::error::StorageResult;

/// A single batch operation
#[derive(Clone, Debug)]
pub enum BatchOp {
    /// Insert or overwrite a key
    Put {
        /// Column family
        cf_name: String,
        /// Key bytes
        key: Vec<u8>,
        /// Value bytes
        value: Vec<u8>,
    },
    /// Remove a key
    Delete {
        /// Column family
        cf_name: String,
        /// Key bytes
        key: Vec<u8>,
    },
}

/// An ordered set of writes applied atomically within one store
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    operations: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a put operation
    pub fn put(&mut self, cf_name: &str, key: &[u8], value: &[u8]) {
        self.operations.push(BatchOp::Put {
            cf_name: cf_name.to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    /// Add a delete operation
    pub fn delete(&mut self, cf_name: &str, key: &[u8]) {
        self.operations.push(BatchOp::Delete {
            cf_name: cf_name.to_string(),
            key: key.to_vec(),
        });
    }

    /// Number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Consume the batch, yielding its operations in order
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.operations
    }
}

/// Persistent key-value store with column families.
///
/// Implemented by the RocksDB `Database` and by the in-memory `MemoryStore`.
/// A batch is atomic within the store; there is no atomicity across separate
/// `put`/`write_batch` calls.
pub trait KvStore: Clone + Send + Sync {
    /// Get a value
    fn get(&self, cf_name: &str, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Put a value
    fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Delete a value
    fn delete(&self, cf_name: &str, key: &[u8]) -> StorageResult<()>;

    /// Apply a batch of writes atomically
    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Force buffered writes to durable media
    fn flush(&self) -> StorageResult<()>;
}
