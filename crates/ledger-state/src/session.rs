//! Write-ahead execution session.
//!
//! A `Session` accumulates an epoch: transactions are applied one at a time
//! against the working state, producing receipts and logs in memory, and a
//! final `commit` makes the epoch durable. Commit runs a fixed sequence of
//! stages with no atomicity across them; on failure the `CommitError`
//! variant identifies exactly which writes landed.

use ledger_engine::{create_address, ExecContext, ExecutionEngine, GasPool};
use ledger_primitives::H256;
use ledger_storage::{
    keys::{cf, receipt_key, HEAD_TX_KEY, ROOT_KEY},
    KvStore, WriteBatch,
};
use ledger_types::{
    codec::{encode_receipt, encode_tx},
    Log, Receipt, SignedTransaction, Signer,
};
use tracing::{debug, error};

use crate::error::{CommitError, SessionError};
use crate::working::WorkingState;

/// Default per-epoch gas allowance
pub const DEFAULT_GAS_LIMIT: u64 = 10_000_000;

/// Session tuning knobs
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Gas allowance for one epoch
    pub gas_limit: u64,
    /// Drop accounts that end a transaction with no state
    pub prune_empty_accounts: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            prune_empty_accounts: true,
        }
    }
}

/// One epoch of write-ahead execution over the working state.
///
/// After a successful or failed `commit`, the caller must `reset` before
/// applying further transactions; applied buffers are kept around so a
/// failed commit can be inspected.
pub struct Session<E: ExecutionEngine, K: KvStore> {
    kv: K,
    working: WorkingState<K>,
    signer: Signer,
    engine: E,
    config: SessionConfig,
    transactions: Vec<SignedTransaction>,
    receipts: Vec<Receipt>,
    logs: Vec<Log>,
    gas_pool: GasPool,
    total_gas_used: u64,
    tx_index: u64,
}

impl<E: ExecutionEngine, K: KvStore> Session<E, K> {
    /// Open a session on the state at `root`
    pub fn new(
        kv: K,
        root: H256,
        signer: Signer,
        engine: E,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let working = WorkingState::open(kv.clone(), root)
            .map_err(|source| SessionError::StateLoad { root, source })?;
        Ok(Self {
            kv,
            working,
            signer,
            engine,
            config,
            transactions: Vec::new(),
            receipts: Vec::new(),
            logs: Vec::new(),
            gas_pool: GasPool::new(config.gas_limit),
            total_gas_used: 0,
            tx_index: 0,
        })
    }

    /// Rebind to `root` and clear all epoch buffers, refilling the gas pool
    pub fn reset(&mut self, root: H256) -> Result<(), SessionError> {
        self.working
            .rebind(root)
            .map_err(|source| SessionError::StateLoad { root, source })?;
        self.transactions.clear();
        self.receipts.clear();
        self.logs.clear();
        self.gas_pool = GasPool::new(self.config.gas_limit);
        self.total_gas_used = 0;
        self.tx_index = 0;
        debug!(root = %root, gas_limit = self.config.gas_limit, "session reset");
        Ok(())
    }

    /// Apply one transaction to the epoch.
    ///
    /// On `Ok` the transaction, its receipt and its logs have been appended
    /// to the epoch buffers. On `Err` the buffers, the gas pool and the
    /// state are exactly as they were before the call; a reverted execution
    /// is not an error and yields a failure receipt instead.
    pub fn apply_transaction(
        &mut self,
        tx: &SignedTransaction,
        tx_index: u64,
        block_hash: H256,
    ) -> Result<(), SessionError> {
        let tx_hash = tx.hash();

        let msg = self
            .signer
            .derive_message(tx)
            .map_err(|source| SessionError::SignatureDerivation { tx_hash, source })?;

        let ctx = ExecContext::new(msg.from, msg.gas_price, 0, block_hash);
        self.working.prepare(tx_hash, block_hash, tx_index);

        let execution = self
            .engine
            .execute(&msg, &ctx, &mut self.working, &mut self.gas_pool)
            .map_err(|source| SessionError::Execution { tx_hash, source })?;

        let root = self
            .working
            .intermediate_root(self.config.prune_empty_accounts);
        self.total_gas_used += execution.gas_used;

        let logs = self.working.logs_for(&tx_hash);
        let mut receipt = Receipt::new(
            root,
            (!execution.reverted).into(),
            self.total_gas_used,
            tx_hash,
            execution.gas_used,
            logs.clone(),
        );
        if msg.is_creation() {
            receipt = receipt.with_contract_address(create_address(&msg.from, msg.nonce));
        }

        debug!(
            tx_hash = %tx_hash,
            tx_index,
            gas_used = execution.gas_used,
            reverted = execution.reverted,
            "transaction applied"
        );

        self.transactions.push(tx.clone());
        self.receipts.push(receipt);
        self.logs.extend(logs);
        self.tx_index += 1;
        Ok(())
    }

    /// Commit the epoch: finalize state, flush it, then write the root
    /// pointer, the head-transaction pointer, the transaction records and
    /// the receipt records, in that order. Returns the committed root.
    ///
    /// The epoch buffers are left intact; call `reset` to start the next
    /// epoch.
    pub fn commit(&mut self) -> Result<H256, CommitError> {
        let root = self
            .working
            .finalize_root(self.config.prune_empty_accounts)
            .map_err(|source| {
                error!(error = %source, "commit: state finalize failed");
                CommitError::StateFinalize(source)
            })?;

        self.working.flush_to_disk(root, true).map_err(|source| {
            error!(root = %root, error = %source, "commit: state flush failed");
            CommitError::TrieFlush { root, source }
        })?;

        self.kv
            .put(cf::LEDGER, ROOT_KEY, root.as_bytes())
            .map_err(|source| {
                error!(root = %root, error = %source, "commit: root pointer write failed");
                CommitError::RootWrite { root, source }
            })?;

        let head = self
            .transactions
            .last()
            .map(|tx| tx.hash())
            .unwrap_or(H256::ZERO);
        self.kv
            .put(cf::LEDGER, HEAD_TX_KEY, head.as_bytes())
            .map_err(|source| {
                error!(tx_hash = %head, error = %source, "commit: head pointer write failed");
                CommitError::HeadWrite { tx_hash: head, source }
            })?;

        let mut tx_batch = WriteBatch::new();
        for tx in &self.transactions {
            tx_batch.put(cf::LEDGER, tx.hash().as_bytes(), &encode_tx(tx));
        }
        self.kv.write_batch(tx_batch).map_err(|source| {
            error!(error = %source, "commit: transaction batch write failed");
            CommitError::TxWrite(source)
        })?;

        let mut receipt_batch = WriteBatch::new();
        for receipt in &self.receipts {
            receipt_batch.put(
                cf::LEDGER,
                &receipt_key(&receipt.tx_hash),
                &encode_receipt(receipt),
            );
        }
        self.kv.write_batch(receipt_batch).map_err(|source| {
            error!(error = %source, "commit: receipt batch write failed");
            CommitError::ReceiptWrite(source)
        })?;

        debug!(
            root = %root,
            head = %head,
            transactions = self.transactions.len(),
            gas_used = self.total_gas_used,
            "epoch committed"
        );
        Ok(root)
    }

    /// Transactions applied this epoch
    pub fn transactions(&self) -> &[SignedTransaction] {
        &self.transactions
    }

    /// Receipts produced this epoch
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Logs emitted this epoch, in application order
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Gas used by the epoch so far
    pub fn gas_used(&self) -> u64 {
        self.total_gas_used
    }

    /// Gas still available in the epoch pool
    pub fn remaining_gas(&self) -> u64 {
        self.gas_pool.remaining()
    }

    /// Index the next applied transaction will take; always equals the
    /// number of buffered transactions and receipts
    pub fn tx_index(&self) -> u64 {
        self.tx_index
    }

    /// Read-only view of the working state
    pub fn state(&self) -> &WorkingState<K> {
        &self.working
    }
}
