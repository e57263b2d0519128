//! Column families and the ledger key scheme.

use ledger_primitives::H256;

/// Column family names
pub mod cf {
    /// State snapshots keyed by root
    pub const STATE: &str = "state";
    /// Pointers, transactions and receipts
    pub const LEDGER: &str = "ledger";
}

/// All column family names
pub const ALL_CFS: &[&str] = &[cf::STATE, cf::LEDGER];

/// Key of the committed state root pointer
pub const ROOT_KEY: &[u8] = b"root";

/// Key of the head-transaction pointer
pub const HEAD_TX_KEY: &[u8] = b"LastTx";

/// Prefix discriminating receipt records from transaction records
pub const RECEIPT_PREFIX: &[u8] = b"receipts-";

/// Key of the receipt for a transaction
pub fn receipt_key(tx_hash: &H256) -> Vec<u8> {
    let mut key = Vec::with_capacity(RECEIPT_PREFIX.len() + H256::LEN);
    key.extend_from_slice(RECEIPT_PREFIX);
    key.extend_from_slice(tx_hash.as_bytes());
    key
}
