//! Account record held in the versioned state.

use ledger_primitives::H256;

/// keccak256 of empty code
pub const EMPTY_CODE_HASH: H256 = H256::from_bytes([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c,
    0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b,
    0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// Account state: nonce, balance and code hash
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Transaction count of this account
    pub nonce: u64,
    /// Balance
    pub balance: u128,
    /// Hash of the account code (EMPTY_CODE_HASH when there is none)
    pub code_hash: H256,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            nonce: 0,
            balance: 0,
            code_hash: EMPTY_CODE_HASH,
        }
    }
}

impl Account {
    /// Serialized length: nonce (8) + balance (16) + code_hash (32)
    pub const ENCODED_LEN: usize = 56;

    /// Create an account holding only a balance
    pub fn with_balance(balance: u128) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    /// Whether this account carries no state at all
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance == 0 && self.code_hash == EMPTY_CODE_HASH
    }

    /// Whether this account has code
    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH
    }

    /// Serialize to a fixed-size little-endian record
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf.extend_from_slice(&self.balance.to_le_bytes());
        buf.extend_from_slice(self.code_hash.as_bytes());
        buf
    }

    /// Deserialize from the fixed-size record
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::ENCODED_LEN {
            return None;
        }
        let nonce = u64::from_le_bytes(bytes[0..8].try_into().ok()?);
        let balance = u128::from_le_bytes(bytes[8..24].try_into().ok()?);
        let code_hash = H256::from_slice(&bytes[24..56]).ok()?;
        Some(Self {
            nonce,
            balance,
            code_hash,
        })
    }
}
