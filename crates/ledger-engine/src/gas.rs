//! Gas accounting: the epoch gas pool and intrinsic gas.

use crate::error::{EngineError, EngineResult};

/// Base cost of any transaction
pub const TX_GAS: u64 = 21_000;

/// Base cost of an account-creating transaction
pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;

/// Cost per non-zero payload byte
pub const TX_DATA_NON_ZERO_GAS: u64 = 68;

/// Cost per zero payload byte
pub const TX_DATA_ZERO_GAS: u64 = 4;

/// Gas remaining for an epoch. Refilled by `reset`, drawn down by each
/// applied transaction, topped back up with the unused portion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasPool(u64);

impl GasPool {
    /// Create a pool holding `limit` gas
    pub fn new(limit: u64) -> Self {
        GasPool(limit)
    }

    /// Gas remaining in the pool
    pub fn remaining(&self) -> u64 {
        self.0
    }

    /// Draw gas from the pool
    pub fn sub_gas(&mut self, amount: u64) -> EngineResult<()> {
        if self.0 < amount {
            return Err(EngineError::GasPoolDepleted {
                requested: amount,
                remaining: self.0,
            });
        }
        self.0 -= amount;
        Ok(())
    }

    /// Return gas to the pool
    pub fn add_gas(&mut self, amount: u64) {
        self.0 = self.0.saturating_add(amount);
    }
}

/// Intrinsic gas of a message: base cost plus per-byte payload cost
pub fn intrinsic_gas(payload: &[u8], is_creation: bool) -> u64 {
    let base = if is_creation {
        TX_GAS_CONTRACT_CREATION
    } else {
        TX_GAS
    };
    let mut gas = base;
    for &byte in payload {
        gas += if byte == 0 {
            TX_DATA_ZERO_GAS
        } else {
            TX_DATA_NON_ZERO_GAS
        };
    }
    gas
}
