//! Receipts and logs produced by transaction execution.

use bytes::Bytes;
use ledger_primitives::{Address, H256};

use crate::bloom::Bloom;

/// Transaction execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Execution reverted
    Failure = 0,
    /// Execution succeeded
    Success = 1,
}

impl From<bool> for TxStatus {
    fn from(success: bool) -> Self {
        if success {
            TxStatus::Success
        } else {
            TxStatus::Failure
        }
    }
}

impl From<TxStatus> for bool {
    fn from(status: TxStatus) -> Self {
        matches!(status, TxStatus::Success)
    }
}

/// Log entry emitted during execution, attributed to the transaction that
/// produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// Account that emitted the log
    pub address: Address,
    /// Topics (indexed fields)
    pub topics: Vec<H256>,
    /// Data (non-indexed fields)
    pub data: Bytes,
    /// Hash of the transaction that emitted the log
    pub tx_hash: H256,
    /// Hash of the enclosing block
    pub block_hash: H256,
    /// Position of the transaction within the epoch
    pub tx_index: u64,
}

impl Log {
    /// Create a new log entry
    pub fn new(
        address: Address,
        topics: Vec<H256>,
        data: Bytes,
        tx_hash: H256,
        block_hash: H256,
        tx_index: u64,
    ) -> Self {
        Self {
            address,
            topics,
            data,
            tx_hash,
            block_hash,
            tx_index,
        }
    }

    /// First topic, usually the event signature
    pub fn topic0(&self) -> Option<&H256> {
        self.topics.first()
    }

    /// Bloom filter covering the address and topics of this log
    pub fn bloom(&self) -> Bloom {
        let mut bloom = Bloom::default();
        bloom.accrue(self.address.as_bytes());
        for topic in &self.topics {
            bloom.accrue(topic.as_bytes());
        }
        bloom
    }
}

/// Receipt recording the outcome of a single transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Intermediate state root after this transaction
    pub state_root: H256,
    /// Success / failure flag
    pub status: TxStatus,
    /// Gas used by the epoch up to and including this transaction
    pub cumulative_gas_used: u64,
    /// Hash of the transaction this receipt belongs to
    pub tx_hash: H256,
    /// Gas used by this transaction alone
    pub gas_used: u64,
    /// Address of the created account (creation transactions only)
    pub contract_address: Option<Address>,
    /// Logs emitted by this transaction
    pub logs: Vec<Log>,
    /// Bloom filter over the logs
    pub logs_bloom: Bloom,
}

impl Receipt {
    /// Create a new receipt, computing the logs bloom from the logs
    pub fn new(
        state_root: H256,
        status: TxStatus,
        cumulative_gas_used: u64,
        tx_hash: H256,
        gas_used: u64,
        logs: Vec<Log>,
    ) -> Self {
        let mut logs_bloom = Bloom::default();
        for log in &logs {
            logs_bloom.accrue_bloom(&log.bloom());
        }
        Self {
            state_root,
            status,
            cumulative_gas_used,
            tx_hash,
            gas_used,
            contract_address: None,
            logs,
            logs_bloom,
        }
    }

    /// Attach the created account address
    pub fn with_contract_address(mut self, address: Address) -> Self {
        self.contract_address = Some(address);
        self
    }

    /// Whether the transaction succeeded
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}
