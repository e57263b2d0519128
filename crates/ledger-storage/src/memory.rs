//! In-memory store for tests, with write fault injection.

use crate::error::{StorageError, StorageResult};
use crate::keys::ALL_CFS;
use crate::traits::{BatchOp, KvStore, WriteBatch};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

struct Inner {
    cfs: BTreeMap<String, BTreeMap<Vec<u8>, Vec<u8>>>,
    // None = never fail; Some(n) = allow n more write operations, then fail
    writes_left: Option<u64>,
}

/// In-memory `KvStore`. Every write operation (put, delete, batch, flush)
/// counts against the injected budget set by `fail_after`.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with all column families present
    pub fn new() -> Self {
        let mut cfs = BTreeMap::new();
        for name in ALL_CFS {
            cfs.insert(name.to_string(), BTreeMap::new());
        }
        Self {
            inner: Arc::new(RwLock::new(Inner {
                cfs,
                writes_left: None,
            })),
        }
    }

    /// Allow `n` more write operations, then fail every subsequent one
    pub fn fail_after(&self, n: u64) {
        self.inner.write().writes_left = Some(n);
    }

    /// Clear any injected failure budget
    pub fn heal(&self) {
        self.inner.write().writes_left = None;
    }

    /// Number of keys in a column family
    pub fn len(&self, cf_name: &str) -> usize {
        self.inner
            .read()
            .cfs
            .get(cf_name)
            .map(|cf| cf.len())
            .unwrap_or(0)
    }

    /// Whether a column family holds no keys
    pub fn is_empty(&self, cf_name: &str) -> bool {
        self.len(cf_name) == 0
    }

    fn charge_write(inner: &mut Inner) -> StorageResult<()> {
        if let Some(left) = inner.writes_left.as_mut() {
            if *left == 0 {
                return Err(StorageError::Io(std::io::Error::other(
                    "injected write failure",
                )));
            }
            *left -= 1;
        }
        Ok(())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, cf_name: &str, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let inner = self.inner.read();
        let cf = inner
            .cfs
            .get(cf_name)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf_name.to_string()))?;
        Ok(cf.get(key).cloned())
    }

    fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let mut inner = self.inner.write();
        Self::charge_write(&mut inner)?;
        let cf = inner
            .cfs
            .get_mut(cf_name)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf_name.to_string()))?;
        cf.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, cf_name: &str, key: &[u8]) -> StorageResult<()> {
        let mut inner = self.inner.write();
        Self::charge_write(&mut inner)?;
        let cf = inner
            .cfs
            .get_mut(cf_name)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf_name.to_string()))?;
        cf.remove(key);
        Ok(())
    }

    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut inner = self.inner.write();
        Self::charge_write(&mut inner)?;
        let ops = batch.into_ops();
        // Validate column families before mutating so the batch stays atomic
        for op in &ops {
            let cf_name = match op {
                BatchOp::Put { cf_name, .. } | BatchOp::Delete { cf_name, .. } => cf_name,
            };
            if !inner.cfs.contains_key(cf_name) {
                return Err(StorageError::InvalidColumnFamily(cf_name.clone()));
            }
        }
        for op in ops {
            match op {
                BatchOp::Put {
                    cf_name,
                    key,
                    value,
                } => {
                    if let Some(cf) = inner.cfs.get_mut(&cf_name) {
                        cf.insert(key, value);
                    }
                }
                BatchOp::Delete { cf_name, key } => {
                    if let Some(cf) = inner.cfs.get_mut(&cf_name) {
                        cf.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        let mut inner = self.inner.write();
        Self::charge_write(&mut inner)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::cf;

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put(cf::LEDGER, b"k", b"v").unwrap();
        assert_eq!(store.get(cf::LEDGER, b"k").unwrap(), Some(b"v".to_vec()));

        store.delete(cf::LEDGER, b"k").unwrap();
        assert_eq!(store.get(cf::LEDGER, b"k").unwrap(), None);
    }

    #[test]
    fn test_unknown_cf() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("nope", b"k"),
            Err(StorageError::InvalidColumnFamily(_))
        ));
    }

    #[test]
    fn test_batch_applies_all() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put(cf::LEDGER, b"a", b"1");
        batch.put(cf::STATE, b"b", b"2");
        store.write_batch(batch).unwrap();

        assert_eq!(store.get(cf::LEDGER, b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(cf::STATE, b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_clone_shares_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.put(cf::LEDGER, b"k", b"v").unwrap();
        assert_eq!(other.get(cf::LEDGER, b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_fail_after_budget() {
        let store = MemoryStore::new();
        store.fail_after(2);

        store.put(cf::LEDGER, b"a", b"1").unwrap();
        store.put(cf::LEDGER, b"b", b"2").unwrap();
        assert!(store.put(cf::LEDGER, b"c", b"3").is_err());

        // Reads are never charged
        assert_eq!(store.get(cf::LEDGER, b"a").unwrap(), Some(b"1".to_vec()));
        // The failed write left nothing behind
        assert_eq!(store.get(cf::LEDGER, b"c").unwrap(), None);
    }

    #[test]
    fn test_fail_after_zero_fails_immediately() {
        let store = MemoryStore::new();
        store.fail_after(0);
        assert!(store.flush().is_err());
        assert!(store.put(cf::LEDGER, b"k", b"v").is_err());
    }

    #[test]
    fn test_heal_restores_writes() {
        let store = MemoryStore::new();
        store.fail_after(0);
        assert!(store.put(cf::LEDGER, b"k", b"v").is_err());

        store.heal();
        store.put(cf::LEDGER, b"k", b"v").unwrap();
        assert_eq!(store.get(cf::LEDGER, b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_batch_counts_as_one_write() {
        let store = MemoryStore::new();
        store.fail_after(1);

        let mut batch = WriteBatch::new();
        batch.put(cf::LEDGER, b"a", b"1");
        batch.put(cf::LEDGER, b"b", b"2");
        store.write_batch(batch).unwrap();

        assert!(store.flush().is_err());
    }
}
