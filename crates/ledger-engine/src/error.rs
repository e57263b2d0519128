//! Engine-level faults.
//!
//! These are distinct from reverted executions: a revert is a successful
//! `execute` call whose result carries the failure flag, while an
//! `EngineError` aborts the call before any state or gas-pool mutation.

use thiserror::Error;

/// Engine-level execution fault
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The epoch gas pool cannot cover the transaction gas limit
    #[error("gas pool depleted: requested {requested}, remaining {remaining}")]
    GasPoolDepleted {
        /// Gas requested from the pool
        requested: u64,
        /// Gas remaining in the pool
        remaining: u64,
    },

    /// The transaction gas limit does not cover the intrinsic cost
    #[error("intrinsic gas {required} exceeds gas limit {limit}")]
    IntrinsicGas {
        /// Intrinsic gas of the message
        required: u64,
        /// Gas limit of the message
        limit: u64,
    },

    /// The sender nonce does not match the account nonce
    #[error("nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch {
        /// Nonce recorded on the sender account
        expected: u64,
        /// Nonce carried by the message
        got: u64,
    },

    /// The sender cannot pay for the gas purchase
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Up-front gas cost
        required: u128,
        /// Sender balance
        available: u128,
    },
}

/// Engine result alias
pub type EngineResult<T> = Result<T, EngineError>;
