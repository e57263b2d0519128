//! Execution context handed to the engine for each message.

use ledger_primitives::{Address, H256};
use std::fmt;
use std::sync::Arc;

/// Historical block-hash oracle
pub type HashOracle = Arc<dyn Fn(u64) -> H256 + Send + Sync>;

/// Per-message execution environment
#[derive(Clone)]
pub struct ExecContext {
    /// Transaction origin (the recovered sender)
    pub origin: Address,
    /// Gas price paid by the origin
    pub gas_price: u128,
    /// Height of the enclosing block
    pub block_number: u64,
    /// Hash of the enclosing block
    pub block_hash: H256,
    oracle: HashOracle,
}

impl ExecContext {
    /// Build a context whose oracle resolves every height to the enclosing
    /// block hash. Historical lookups are out of scope; the constant answer
    /// is a deliberate simplification.
    pub fn new(origin: Address, gas_price: u128, block_number: u64, block_hash: H256) -> Self {
        Self {
            origin,
            gas_price,
            block_number,
            block_hash,
            oracle: Arc::new(move |_height| block_hash),
        }
    }

    /// Build a context with a caller-supplied oracle
    pub fn with_oracle(
        origin: Address,
        gas_price: u128,
        block_number: u64,
        block_hash: H256,
        oracle: HashOracle,
    ) -> Self {
        Self {
            origin,
            gas_price,
            block_number,
            block_hash,
            oracle,
        }
    }

    /// Resolve the hash of a historical block
    pub fn historical_hash(&self, height: u64) -> H256 {
        (self.oracle)(height)
    }
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("origin", &self.origin)
            .field("gas_price", &self.gas_price)
            .field("block_number", &self.block_number)
            .field("block_hash", &self.block_hash)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_oracle() {
        let block_hash = H256::from_bytes([0xab; 32]);
        let ctx = ExecContext::new(Address::ZERO, 1, 0, block_hash);
        assert_eq!(ctx.historical_hash(0), block_hash);
        assert_eq!(ctx.historical_hash(12_345), block_hash);
    }

    #[test]
    fn test_custom_oracle() {
        let ctx = ExecContext::with_oracle(
            Address::ZERO,
            1,
            7,
            H256::ZERO,
            Arc::new(|height| {
                let mut bytes = [0u8; 32];
                bytes[24..].copy_from_slice(&height.to_be_bytes());
                H256::from_bytes(bytes)
            }),
        );
        assert_eq!(ctx.historical_hash(1).as_bytes()[31], 1);
    }
}
