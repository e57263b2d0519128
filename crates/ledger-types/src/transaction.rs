//! Signed transaction type.

use bytes::Bytes;
use ledger_crypto::keccak256;
use ledger_primitives::{Address, H256};

use crate::codec::encode_tx;

/// Signature components carried by a signed transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxSignature {
    /// v value (EIP-155 style: recovery_id + chain_id * 2 + 35, or legacy 27/28)
    pub v: u64,
    /// R component
    pub r: H256,
    /// S component
    pub s: H256,
}

impl TxSignature {
    /// Create a new signature
    pub fn new(v: u64, r: H256, s: H256) -> Self {
        Self { v, r, s }
    }

    /// Check basic well-formedness (non-zero r and s)
    pub fn is_valid(&self) -> bool {
        !self.r.is_zero() && !self.s.is_zero()
    }
}

/// A signed transaction as submitted to the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Sender account nonce
    pub nonce: u64,
    /// Gas price
    pub gas_price: u128,
    /// Gas limit for this transaction
    pub gas_limit: u64,
    /// Recipient (None for contract creation)
    pub to: Option<Address>,
    /// Value to transfer
    pub value: u128,
    /// Payload (call data, or init payload for creation)
    pub payload: Bytes,
    /// Signature
    pub signature: TxSignature,
}

impl SignedTransaction {
    /// Transaction hash: keccak of the wire encoding
    pub fn hash(&self) -> H256 {
        keccak256(&encode_tx(self))
    }

    /// Whether this transaction creates a new account
    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }
}
