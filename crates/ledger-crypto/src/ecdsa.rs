//! secp256k1 ECDSA: signing, public-key recovery and address derivation.

use crate::{keccak256, CryptoError};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use ledger_primitives::{Address, H256};

/// Half of the secp256k1 curve order (n/2), big endian
const SECP256K1_N_DIV_2: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D,
    0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// secp256k1 curve order (n), big endian
const SECP256K1_N: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B,
    0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Recoverable ECDSA signature (r, s, recovery byte)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    /// r component (32 bytes, big endian)
    pub r: [u8; 32],
    /// s component (32 bytes, big endian)
    pub s: [u8; 32],
    /// recovery id, stored as 27 or 28
    pub v: u8,
}

/// Public key (secp256k1 verifying key)
pub type PublicKey = VerifyingKey;

/// Private key (secp256k1 signing key)
pub type PrivateKey = SigningKey;

impl RecoverableSignature {
    /// Create from r, s, v components
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        RecoverableSignature { r, s, v }
    }

    /// Recovery id (0 or 1)
    pub fn recovery_id(&self) -> u8 {
        if self.v >= 27 {
            self.v - 27
        } else {
            self.v
        }
    }

    /// Whether s is in the lower half of the scalar range
    pub fn is_low_s(&self) -> bool {
        compare_be(&self.s, &SECP256K1_N_DIV_2) != std::cmp::Ordering::Greater
    }
}

fn compare_be(a: &[u8; 32], b: &[u8; 32]) -> std::cmp::Ordering {
    for i in 0..32 {
        match a[i].cmp(&b[i]) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

/// n - s, used to normalize a high-s signature
fn subtract_from_n(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: u16 = 0;
    for i in (0..32).rev() {
        let diff = (SECP256K1_N[i] as u16)
            .wrapping_sub(s[i] as u16)
            .wrapping_sub(borrow);
        result[i] = diff as u8;
        borrow = if diff > 255 { 1 } else { 0 };
    }
    result
}

/// Sign a 32-byte digest. The result is always low-s; when normalization
/// flips s, the recovery id flips with it.
pub fn sign_digest(
    digest: &H256,
    private_key: &PrivateKey,
) -> Result<RecoverableSignature, CryptoError> {
    let (signature, mut recovery_id) = private_key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let r_bytes: [u8; 32] = signature.r().to_bytes().into();
    let mut s_bytes: [u8; 32] = signature.s().to_bytes().into();

    if compare_be(&s_bytes, &SECP256K1_N_DIV_2) == std::cmp::Ordering::Greater {
        s_bytes = subtract_from_n(&s_bytes);
        recovery_id = RecoveryId::try_from(recovery_id.to_byte() ^ 1).map_err(|_| {
            CryptoError::SigningFailed("recovery id out of range after normalization".to_string())
        })?;
    }

    Ok(RecoverableSignature {
        r: r_bytes,
        s: s_bytes,
        v: recovery_id.to_byte() + 27,
    })
}

/// Recover the public key that produced a signature over a 32-byte digest.
/// High-s signatures are rejected.
pub fn recover_public_key(
    digest: &H256,
    signature: &RecoverableSignature,
) -> Result<PublicKey, CryptoError> {
    if !signature.is_low_s() {
        return Err(CryptoError::HighS);
    }

    let r: k256::FieldBytes = signature.r.into();
    let s: k256::FieldBytes = signature.s.into();
    let k256_sig = K256Signature::from_scalars(r, s)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let recovery_id = RecoveryId::try_from(signature.recovery_id())
        .map_err(|_| CryptoError::InvalidRecoveryId(signature.recovery_id()))?;

    VerifyingKey::recover_from_prehash(digest.as_bytes(), &k256_sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))
}

/// Derive the account address: last 20 bytes of the keccak of the
/// uncompressed public key without the 0x04 prefix.
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut addr_bytes = [0u8; 20];
    addr_bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(addr_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_sign_and_recover() {
        let private_key = SigningKey::random(&mut OsRng);
        let public_key = private_key.verifying_key();

        let digest = keccak256(b"test message");
        let signature = sign_digest(&digest, &private_key).unwrap();
        assert!(signature.is_low_s());

        let recovered = recover_public_key(&digest, &signature).unwrap();
        assert_eq!(public_key, &recovered);
    }

    #[test]
    fn test_recovered_address_matches() {
        let private_key = SigningKey::random(&mut OsRng);
        let expected = public_key_to_address(private_key.verifying_key());

        let digest = keccak256(b"another message");
        let signature = sign_digest(&digest, &private_key).unwrap();
        let recovered = recover_public_key(&digest, &signature).unwrap();
        assert_eq!(public_key_to_address(&recovered), expected);
    }

    #[test]
    fn test_low_s_always() {
        for i in 0u8..10 {
            let private_key = SigningKey::random(&mut OsRng);
            let digest = keccak256(&[i]);
            let signature = sign_digest(&digest, &private_key).unwrap();
            assert!(signature.is_low_s());
        }
    }

    #[test]
    fn test_high_s_rejected() {
        let private_key = SigningKey::random(&mut OsRng);
        let digest = keccak256(b"test");
        let mut signature = sign_digest(&digest, &private_key).unwrap();
        signature.s = [0xFF; 32];
        assert!(matches!(
            recover_public_key(&digest, &signature),
            Err(CryptoError::HighS)
        ));
    }

    #[test]
    fn test_recovery_id_round_trip() {
        let sig = RecoverableSignature::new([1; 32], [2; 32], 28);
        assert_eq!(sig.recovery_id(), 1);
        let sig = RecoverableSignature::new([1; 32], [2; 32], 27);
        assert_eq!(sig.recovery_id(), 0);
    }
}
