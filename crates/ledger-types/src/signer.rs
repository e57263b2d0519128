//! Sender recovery and message derivation.
//!
//! A `Signer` is bound to a chain id. It turns a `SignedTransaction` into a
//! `Message` by recovering the sender from the signature over the EIP-155
//! style signing preimage.

use bytes::Bytes;
use ledger_crypto::{
    keccak256, public_key_to_address, recover_public_key, sign_digest, PrivateKey,
    RecoverableSignature,
};
use ledger_primitives::{Address, H256};
use ledger_rlp::RlpStream;
use thiserror::Error;

use crate::transaction::{SignedTransaction, TxSignature};

/// Failure to derive a message from a signed transaction
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Signature has zero r or s
    #[error("malformed signature")]
    Malformed,

    /// Recovery id does not match this chain
    #[error("v value {0} does not encode a recovery id for this chain")]
    InvalidV(u64),

    /// Public key recovery failed
    #[error("sender recovery failed: {0}")]
    Recovery(#[from] ledger_crypto::CryptoError),
}

/// An executable message: a transaction with its sender resolved
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Recovered sender
    pub from: Address,
    /// Sender account nonce
    pub nonce: u64,
    /// Gas price
    pub gas_price: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient (None for creation)
    pub to: Option<Address>,
    /// Value to transfer
    pub value: u128,
    /// Payload
    pub payload: Bytes,
}

impl Message {
    /// Whether this message creates a new account
    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// Chain-bound signer
#[derive(Clone, Copy, Debug)]
pub struct Signer {
    chain_id: u64,
}

impl Signer {
    /// Create a signer for the given chain
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    /// Chain id this signer is bound to
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Signing preimage hash:
    /// keccak256(RLP([nonce, gas_price, gas_limit, to, value, payload, chain_id, 0, 0]))
    pub fn signing_hash(&self, tx: &SignedTransaction) -> H256 {
        let mut stream = RlpStream::new_list(9);
        stream.append(&tx.nonce);
        stream.append(&tx.gas_price);
        stream.append(&tx.gas_limit);
        if let Some(to) = &tx.to {
            stream.append(to);
        } else {
            stream.append_empty_data();
        }
        stream.append(&tx.value);
        stream.append(&tx.payload.to_vec());
        stream.append(&self.chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        keccak256(&stream.out())
    }

    /// Recover the sender and build the executable message
    pub fn derive_message(&self, tx: &SignedTransaction) -> Result<Message, SignatureError> {
        if !tx.signature.is_valid() {
            return Err(SignatureError::Malformed);
        }

        let digest = self.signing_hash(tx);
        let recovery_v = self.recovery_v(tx.signature.v)?;

        let sig = RecoverableSignature::new(
            *tx.signature.r.as_bytes(),
            *tx.signature.s.as_bytes(),
            recovery_v,
        );
        let pubkey = recover_public_key(&digest, &sig)?;

        Ok(Message {
            from: public_key_to_address(&pubkey),
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            to: tx.to,
            value: tx.value,
            payload: tx.payload.clone(),
        })
    }

    /// Convert a chain-scoped v back to a raw recovery byte (27/28)
    fn recovery_v(&self, v: u64) -> Result<u8, SignatureError> {
        if v == 27 || v == 28 {
            return Ok(v as u8);
        }
        let base = self.chain_id * 2 + 35;
        match v.checked_sub(base) {
            Some(id @ 0..=1) => Ok(id as u8 + 27),
            _ => Err(SignatureError::InvalidV(v)),
        }
    }

    /// Sign an unsigned transaction body with a private key. The signature's
    /// v is chain-scoped (recovery_id + chain_id * 2 + 35).
    pub fn sign(
        &self,
        mut tx: SignedTransaction,
        key: &PrivateKey,
    ) -> Result<SignedTransaction, SignatureError> {
        // Preimage does not depend on the signature fields
        let digest = self.signing_hash(&tx);
        let sig = sign_digest(&digest, key)?;
        let recovery_id = (sig.v - 27) as u64;
        tx.signature = TxSignature::new(
            recovery_id + self.chain_id * 2 + 35,
            H256::from_bytes(sig.r),
            H256::from_bytes(sig.s),
        );
        Ok(tx)
    }
}
