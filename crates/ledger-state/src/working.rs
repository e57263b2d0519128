//! Versioned in-memory state over a key-value store.
//!
//! A `WorkingState` holds the full account set for one state root plus an
//! overlay of writes made during the current epoch. Finalizing folds the
//! overlay in, hashes the canonical encoding into a new root and persists
//! the snapshot under that root.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use ledger_crypto::keccak256;
use ledger_engine::StateAccess;
use ledger_primitives::{Address, H256};
use ledger_storage::{keys::cf, KvStore, StorageError, StorageResult};
use ledger_types::{Account, Log};
use tracing::debug;

/// Relation of the in-memory content to durable snapshots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Content may differ from any persisted snapshot
    Open,
    /// Content hashes to this root and its snapshot is written
    Finalized(H256),
}

/// Attribution context for logs emitted by the transaction being executed
#[derive(Clone, Copy, Debug)]
struct TxTag {
    tx_hash: H256,
    block_hash: H256,
    tx_index: u64,
}

/// Account state at a root, plus the epoch's uncommitted overlay.
#[derive(Clone, Debug)]
pub struct WorkingState<K: KvStore> {
    kv: K,
    accounts: BTreeMap<Address, Account>,
    code: BTreeMap<H256, Vec<u8>>,
    dirty_accounts: HashMap<Address, Account>,
    dirty_code: HashMap<H256, Vec<u8>>,
    logs: HashMap<H256, Vec<Log>>,
    tag: Option<TxTag>,
    phase: Phase,
}

impl<K: KvStore> WorkingState<K> {
    /// Open the state at `root`. `H256::ZERO` means the empty state; any
    /// other root must have a snapshot in the store.
    pub fn open(kv: K, root: H256) -> StorageResult<Self> {
        let (accounts, code) = Self::load(&kv, root)?;
        let phase = if root.is_zero() {
            Phase::Open
        } else {
            Phase::Finalized(root)
        };
        Ok(Self {
            kv,
            accounts,
            code,
            dirty_accounts: HashMap::new(),
            dirty_code: HashMap::new(),
            logs: HashMap::new(),
            tag: None,
            phase,
        })
    }

    /// Point the working state at `root`, discarding the epoch overlay and
    /// logs. When the in-memory content already is `root` with no pending
    /// writes, the snapshot is not re-read.
    pub fn rebind(&mut self, root: H256) -> StorageResult<()> {
        let clean = self.dirty_accounts.is_empty() && self.dirty_code.is_empty();
        if self.phase == Phase::Finalized(root) && clean {
            self.logs.clear();
            self.tag = None;
            return Ok(());
        }

        let (accounts, code) = Self::load(&self.kv, root)?;
        self.accounts = accounts;
        self.code = code;
        self.dirty_accounts.clear();
        self.dirty_code.clear();
        self.logs.clear();
        self.tag = None;
        self.phase = if root.is_zero() {
            Phase::Open
        } else {
            Phase::Finalized(root)
        };
        Ok(())
    }

    /// Set the attribution context for logs emitted by the next execution
    pub fn prepare(&mut self, tx_hash: H256, block_hash: H256, tx_index: u64) {
        self.tag = Some(TxTag {
            tx_hash,
            block_hash,
            tx_index,
        });
    }

    /// Logs emitted by the given transaction during this epoch
    pub fn logs_for(&self, tx_hash: &H256) -> Vec<Log> {
        self.logs.get(tx_hash).cloned().unwrap_or_default()
    }

    /// Fold the overlay into the base state and hash the result.
    ///
    /// With `prune` set, overlay accounts that ended the transaction empty
    /// are dropped from the state instead of being recorded.
    pub fn intermediate_root(&mut self, prune: bool) -> H256 {
        self.fold_overlay(prune);
        if let Phase::Finalized(root) = self.phase {
            return root;
        }
        keccak256(&self.snapshot_bytes())
    }

    /// Fold, hash and persist the snapshot under the resulting root.
    pub fn finalize_root(&mut self, prune: bool) -> StorageResult<H256> {
        self.fold_overlay(prune);
        if let Phase::Finalized(root) = self.phase {
            return Ok(root);
        }
        let bytes = self.snapshot_bytes();
        let root = keccak256(&bytes);
        self.kv.put(cf::STATE, root.as_bytes(), &bytes)?;
        self.phase = Phase::Finalized(root);
        debug!(root = %root, accounts = self.accounts.len(), "state finalized");
        Ok(root)
    }

    /// Force the store's buffered writes down to durable media
    pub fn flush_to_disk(&self, root: H256, force: bool) -> StorageResult<()> {
        debug!(root = %root, force, "flushing state store");
        self.kv.flush()
    }

    /// Read an account through the overlay
    pub fn account(&self, address: &Address) -> Option<Account> {
        self.dirty_accounts
            .get(address)
            .cloned()
            .or_else(|| self.accounts.get(address).cloned())
    }

    /// Read code through the overlay
    pub fn code(&self, code_hash: &H256) -> Option<Vec<u8>> {
        self.dirty_code
            .get(code_hash)
            .cloned()
            .or_else(|| self.code.get(code_hash).cloned())
    }

    fn fold_overlay(&mut self, prune: bool) {
        if self.dirty_accounts.is_empty() && self.dirty_code.is_empty() {
            return;
        }
        for (address, account) in self.dirty_accounts.drain() {
            if prune && account.is_empty() {
                self.accounts.remove(&address);
            } else {
                self.accounts.insert(address, account);
            }
        }
        for (hash, code) in self.dirty_code.drain() {
            self.code.insert(hash, code);
        }
        self.phase = Phase::Open;
    }

    /// Canonical snapshot encoding: accounts then code, each as a count
    /// followed by sorted fixed-layout entries. Map iteration is ordered,
    /// so identical content always yields identical bytes.
    fn snapshot_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.accounts.len() as u32).to_le_bytes());
        for (address, account) in &self.accounts {
            buf.extend_from_slice(address.as_bytes());
            buf.extend_from_slice(&account.to_bytes());
        }
        buf.extend_from_slice(&(self.code.len() as u32).to_le_bytes());
        for (hash, code) in &self.code {
            buf.extend_from_slice(hash.as_bytes());
            buf.extend_from_slice(&(code.len() as u32).to_le_bytes());
            buf.extend_from_slice(code);
        }
        buf
    }

    fn load(
        kv: &K,
        root: H256,
    ) -> StorageResult<(BTreeMap<Address, Account>, BTreeMap<H256, Vec<u8>>)> {
        if root.is_zero() {
            return Ok((BTreeMap::new(), BTreeMap::new()));
        }
        let bytes = kv
            .get(cf::STATE, root.as_bytes())?
            .ok_or_else(|| StorageError::NotFound(format!("state snapshot {root}")))?;
        decode_snapshot(&bytes)
            .ok_or_else(|| StorageError::Corrupt(format!("state snapshot {root}")))
    }
}

impl<K: KvStore> StateAccess for WorkingState<K> {
    fn get_account(&self, address: &Address) -> Option<Account> {
        self.account(address)
    }

    fn set_account(&mut self, address: Address, account: Account) {
        self.dirty_accounts.insert(address, account);
        self.phase = Phase::Open;
    }

    fn get_code(&self, code_hash: &H256) -> Option<Vec<u8>> {
        self.code(code_hash)
    }

    fn set_code(&mut self, code: Vec<u8>) -> H256 {
        let hash = keccak256(&code);
        self.dirty_code.insert(hash, code);
        self.phase = Phase::Open;
        hash
    }

    fn emit_log(&mut self, address: Address, topics: Vec<H256>, data: Bytes) {
        let tag = self.tag.unwrap_or(TxTag {
            tx_hash: H256::ZERO,
            block_hash: H256::ZERO,
            tx_index: 0,
        });
        let log = Log::new(address, topics, data, tag.tx_hash, tag.block_hash, tag.tx_index);
        self.logs.entry(tag.tx_hash).or_default().push(log);
    }
}

fn decode_snapshot(bytes: &[u8]) -> Option<(BTreeMap<Address, Account>, BTreeMap<H256, Vec<u8>>)> {
    let mut pos = 0usize;

    let account_count = read_u32(bytes, &mut pos)?;
    let mut accounts = BTreeMap::new();
    for _ in 0..account_count {
        let address = read_address(bytes, &mut pos)?;
        let account = read_account(bytes, &mut pos)?;
        accounts.insert(address, account);
    }

    let code_count = read_u32(bytes, &mut pos)?;
    let mut code = BTreeMap::new();
    for _ in 0..code_count {
        let hash = read_h256(bytes, &mut pos)?;
        let len = read_u32(bytes, &mut pos)? as usize;
        let end = pos.checked_add(len)?;
        if end > bytes.len() {
            return None;
        }
        code.insert(hash, bytes[pos..end].to_vec());
        pos = end;
    }

    if pos != bytes.len() {
        return None;
    }
    Some((accounts, code))
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> Option<u32> {
    let end = pos.checked_add(4)?;
    let value = u32::from_le_bytes(bytes.get(*pos..end)?.try_into().ok()?);
    *pos = end;
    Some(value)
}

fn read_address(bytes: &[u8], pos: &mut usize) -> Option<Address> {
    let end = pos.checked_add(Address::LEN)?;
    let address = Address::from_slice(bytes.get(*pos..end)?).ok()?;
    *pos = end;
    Some(address)
}

fn read_h256(bytes: &[u8], pos: &mut usize) -> Option<H256> {
    let end = pos.checked_add(H256::LEN)?;
    let hash = H256::from_slice(bytes.get(*pos..end)?).ok()?;
    *pos = end;
    Some(hash)
}

fn read_account(bytes: &[u8], pos: &mut usize) -> Option<Account> {
    let end = pos.checked_add(Account::ENCODED_LEN)?;
    let account = Account::from_bytes(bytes.get(*pos..end)?)?;
    *pos = end;
    Some(account)
}
