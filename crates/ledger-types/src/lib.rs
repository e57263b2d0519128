//! # ledger-types
//!
//! Core data types of the ledger: signed transactions, executable messages,
//! receipts with attributed logs, accounts, the logs bloom filter and the
//! deterministic storage codec.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
mod bloom;
pub mod codec;
mod receipt;
mod signer;
mod transaction;

pub use account::{Account, EMPTY_CODE_HASH};
pub use bloom::Bloom;
pub use receipt::{Log, Receipt, TxStatus};
pub use signer::{Message, SignatureError, Signer};
pub use transaction::{SignedTransaction, TxSignature};
