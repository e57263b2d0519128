//! # ledger-primitives
//!
//! Primitive types shared across the ledger workspace: fixed-size hashes,
//! account addresses and common scalar aliases.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod hash;

pub use address::{Address, AddressError};
pub use hash::{H256, HashError};

/// Gas amount
pub type Gas = u64;

/// Transaction nonce
pub type Nonce = u64;

/// Block height
pub type BlockHeight = u64;
