//! RocksDB-backed store.

use crate::error::{StorageError, StorageResult};
use crate::keys::ALL_CFS;
use crate::traits::{BatchOp, KvStore, WriteBatch};
use parking_lot::RwLock;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, FlushOptions, MultiThreaded,
    Options,
};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

type RocksDB = DBWithThreadMode<MultiThreaded>;

/// Database configuration
#[derive(Clone, Debug)]
pub struct DbConfig {
    /// Create database if missing
    pub create_if_missing: bool,
    /// Maximum number of open files
    pub max_open_files: i32,
    /// Write buffer size
    pub write_buffer_size: usize,
    /// Maximum write buffers
    pub max_write_buffer_number: i32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            max_open_files: 512,
            write_buffer_size: 64 * 1024 * 1024,
            max_write_buffer_number: 3,
        }
    }
}

/// RocksDB wrapper with column family support
pub struct Database {
    db: Arc<RwLock<Option<RocksDB>>>,
    path: String,
}

impl Database {
    /// Create a new database instance (not yet opened)
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            db: Arc::new(RwLock::new(None)),
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Open the database with default config
    pub fn open(&self) -> StorageResult<()> {
        self.open_with_config(DbConfig::default())
    }

    /// Open the database with custom config
    pub fn open_with_config(&self, config: DbConfig) -> StorageResult<()> {
        let mut db_guard = self.db.write();
        if db_guard.is_some() {
            return Err(StorageError::AlreadyOpen);
        }

        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(config.max_open_files);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = RocksDB::open_cf_descriptors(&opts, &self.path, cf_descriptors)?;
        *db_guard = Some(db);
        debug!(path = %self.path, "database opened");
        Ok(())
    }

    /// Close the database
    pub fn close(&self) {
        let mut db_guard = self.db.write();
        *db_guard = None;
    }

    /// Check if database is open
    pub fn is_open(&self) -> bool {
        self.db.read().is_some()
    }

    /// Get database path
    pub fn path(&self) -> &str {
        &self.path
    }

    fn get_cf<'a>(db: &'a RocksDB, name: &str) -> StorageResult<Arc<BoundColumnFamily<'a>>> {
        db.cf_handle(name)
            .ok_or_else(|| StorageError::InvalidColumnFamily(name.to_string()))
    }
}

impl KvStore for Database {
    fn get(&self, cf_name: &str, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;
        let cf = Self::get_cf(db, cf_name)?;
        Ok(db.get_cf(&cf, key)?)
    }

    fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;
        let cf = Self::get_cf(db, cf_name)?;
        db.put_cf(&cf, key, value)?;
        Ok(())
    }

    fn delete(&self, cf_name: &str, key: &[u8]) -> StorageResult<()> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;
        let cf = Self::get_cf(db, cf_name)?;
        db.delete_cf(&cf, key)?;
        Ok(())
    }

    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;

        let mut rocks_batch = rocksdb::WriteBatch::default();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put {
                    cf_name,
                    key,
                    value,
                } => {
                    let cf = Self::get_cf(db, &cf_name)?;
                    rocks_batch.put_cf(&cf, &key, &value);
                }
                BatchOp::Delete { cf_name, key } => {
                    let cf = Self::get_cf(db, &cf_name)?;
                    rocks_batch.delete_cf(&cf, &key);
                }
            }
        }

        db.write(rocks_batch)?;
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or(StorageError::NotOpen)?;
        let mut opts = FlushOptions::default();
        opts.set_wait(true);
        for name in ALL_CFS {
            let cf = Self::get_cf(db, name)?;
            db.flush_cf_opt(&cf, &opts)?;
        }
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            path: self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::cf;
    use std::fs;
    use std::thread;

    fn temp_db_path() -> String {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let cnt = COUNTER.fetch_add(1, Ordering::SeqCst);
        format!("/tmp/ledger_test_db_{}_{}", id, cnt)
    }

    fn cleanup(path: &str) {
        let _ = fs::remove_dir_all(path);
    }

    #[test]
    fn test_open_close() {
        let path = temp_db_path();
        let db = Database::new(&path);

        assert!(!db.is_open());
        db.open().unwrap();
        assert!(db.is_open());
        db.close();
        assert!(!db.is_open());

        cleanup(&path);
    }

    #[test]
    fn test_put_get() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::LEDGER, b"key1", b"value1").unwrap();
        assert_eq!(
            db.get(cf::LEDGER, b"key1").unwrap(),
            Some(b"value1".to_vec())
        );
        assert_eq!(db.get(cf::LEDGER, b"missing").unwrap(), None);

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_delete() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::STATE, b"snap", b"bytes").unwrap();
        assert!(db.get(cf::STATE, b"snap").unwrap().is_some());

        db.delete(cf::STATE, b"snap").unwrap();
        assert!(db.get(cf::STATE, b"snap").unwrap().is_none());

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_write_batch() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        let mut batch = WriteBatch::new();
        batch.put(cf::LEDGER, b"tx1", b"data1");
        batch.put(cf::LEDGER, b"tx2", b"data2");
        batch.put(cf::STATE, b"root1", b"snapshot");
        assert_eq!(batch.len(), 3);
        db.write_batch(batch).unwrap();

        assert_eq!(db.get(cf::LEDGER, b"tx1").unwrap(), Some(b"data1".to_vec()));
        assert_eq!(db.get(cf::LEDGER, b"tx2").unwrap(), Some(b"data2".to_vec()));
        assert_eq!(
            db.get(cf::STATE, b"root1").unwrap(),
            Some(b"snapshot".to_vec())
        );

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_not_open_error() {
        let db = Database::new("/tmp/ledger_not_opened");
        assert!(matches!(
            db.get(cf::LEDGER, b"key"),
            Err(StorageError::NotOpen)
        ));
        assert!(matches!(
            db.put(cf::LEDGER, b"key", b"value"),
            Err(StorageError::NotOpen)
        ));
        assert!(matches!(db.flush(), Err(StorageError::NotOpen)));
    }

    #[test]
    fn test_already_open_error() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();
        assert!(matches!(db.open(), Err(StorageError::AlreadyOpen)));
        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_reopen_persists() {
        let path = temp_db_path();
        let db = Database::new(&path);

        db.open().unwrap();
        db.put(cf::LEDGER, b"key1", b"value1").unwrap();
        db.flush().unwrap();
        db.close();

        db.open().unwrap();
        assert_eq!(
            db.get(cf::LEDGER, b"key1").unwrap(),
            Some(b"value1".to_vec())
        );
        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_column_family_isolation() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::STATE, b"same_key", b"state_value").unwrap();
        db.put(cf::LEDGER, b"same_key", b"ledger_value").unwrap();

        assert_eq!(
            db.get(cf::STATE, b"same_key").unwrap(),
            Some(b"state_value".to_vec())
        );
        assert_eq!(
            db.get(cf::LEDGER, b"same_key").unwrap(),
            Some(b"ledger_value".to_vec())
        );

        db.delete(cf::STATE, b"same_key").unwrap();
        assert!(db.get(cf::STATE, b"same_key").unwrap().is_none());
        assert!(db.get(cf::LEDGER, b"same_key").unwrap().is_some());

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_clone_shares_handle() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        let db_clone = db.clone();
        db.put(cf::LEDGER, b"key1", b"value1").unwrap();
        assert_eq!(
            db_clone.get(cf::LEDGER, b"key1").unwrap(),
            Some(b"value1".to_vec())
        );

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_concurrent_reads() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        for i in 0..50u8 {
            db.put(cf::LEDGER, &[i], &[i, i]).unwrap();
        }

        let db = Arc::new(db);
        let mut handles = vec![];
        for _ in 0..4 {
            let db = Arc::clone(&db);
            handles.push(thread::spawn(move || {
                for i in 0..50u8 {
                    assert_eq!(db.get(cf::LEDGER, &[i]).unwrap(), Some(vec![i, i]));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        db.close();
        cleanup(&path);
    }

    #[test]
    fn test_overwrite_value() {
        let path = temp_db_path();
        let db = Database::new(&path);
        db.open().unwrap();

        db.put(cf::LEDGER, b"key1", b"original").unwrap();
        db.put(cf::LEDGER, b"key1", b"updated").unwrap();
        assert_eq!(
            db.get(cf::LEDGER, b"key1").unwrap(),
            Some(b"updated".to_vec())
        );

        db.close();
        cleanup(&path);
    }
}
