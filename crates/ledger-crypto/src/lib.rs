//! # ledger-crypto
//!
//! Keccak-256 hashing, secp256k1 signing and public-key recovery, and
//! account address derivation.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ecdsa;
mod error;
mod hash;

pub use ecdsa::{
    public_key_to_address, recover_public_key, sign_digest, PrivateKey, PublicKey,
    RecoverableSignature,
};
pub use error::CryptoError;
pub use hash::keccak256;
