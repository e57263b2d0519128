//! Session and commit errors.

use ledger_engine::EngineError;
use ledger_primitives::H256;
use ledger_storage::StorageError;
use ledger_types::SignatureError;
use thiserror::Error;

/// Failure while building or applying to a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// The store could not produce the state at the requested root
    #[error("cannot load state at root {root}: {source}")]
    StateLoad {
        /// Requested root
        root: H256,
        /// Underlying storage failure
        source: StorageError,
    },

    /// Sender recovery failed for a transaction
    #[error("cannot derive message for transaction {tx_hash}: {source}")]
    SignatureDerivation {
        /// Hash of the offending transaction
        tx_hash: H256,
        /// Underlying signature failure
        source: SignatureError,
    },

    /// The engine reported a fault (not a revert)
    #[error("execution of transaction {tx_hash} failed: {source}")]
    Execution {
        /// Hash of the offending transaction
        tx_hash: H256,
        /// Underlying engine fault
        source: EngineError,
    },
}

/// Failure of one commit stage.
///
/// The stages run in order and there is no atomicity across them: the
/// variant tells the caller exactly which writes are durable and which were
/// never attempted. The session does not retry.
#[derive(Debug, Error)]
pub enum CommitError {
    /// Stage 1: folding the epoch into a finalized root failed.
    /// Nothing is durable.
    #[error("state finalize failed: {0}")]
    StateFinalize(#[source] StorageError),

    /// Stage 2: flushing the finalized state failed.
    /// The snapshot may or may not be durable; no pointers were written.
    #[error("state flush at root {root} failed: {source}")]
    TrieFlush {
        /// Root being flushed
        root: H256,
        /// Underlying storage failure
        source: StorageError,
    },

    /// Stage 3a: the root pointer write failed.
    /// State is durable; no pointers were written.
    #[error("root pointer write for {root} failed: {source}")]
    RootWrite {
        /// Root that was being recorded
        root: H256,
        /// Underlying storage failure
        source: StorageError,
    },

    /// Stage 3b: the head-transaction pointer write failed.
    /// State and root pointer are durable.
    #[error("head pointer write for {tx_hash} failed: {source}")]
    HeadWrite {
        /// Head transaction hash that was being recorded
        tx_hash: H256,
        /// Underlying storage failure
        source: StorageError,
    },

    /// Stage 3c: the transaction batch write failed.
    /// State and both pointers are durable; no transaction records exist.
    #[error("transaction batch write failed: {0}")]
    TxWrite(#[source] StorageError),

    /// Stage 3d: the receipt batch write failed.
    /// Everything but the receipt records is durable.
    #[error("receipt batch write failed: {0}")]
    ReceiptWrite(#[source] StorageError),
}
