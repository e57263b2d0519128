//! # ledger-rlp
//!
//! RLP (Recursive Length Prefix) encoding for the ledger, built on the `rlp`
//! crate. Used for the signing preimage of transactions and for the
//! contract-address derivation `keccak256(rlp([sender, nonce]))[12..]`.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export the rlp crate surface for direct use
pub use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

// Re-export primitives with RLP impls enabled
pub use ledger_primitives::{Address, H256};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        let addr = Address::from_bytes([0x42; 20]);
        let encoded = addr.rlp_bytes();
        // 20-byte string: 0x80 + 20 header
        assert_eq!(encoded[0], 0x94);
        assert_eq!(encoded.len(), 21);
        let decoded: Address = Rlp::new(&encoded).as_val().unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn test_h256_roundtrip() {
        let hash = H256::from_bytes([0x42; 32]);
        let encoded = hash.rlp_bytes();
        assert_eq!(encoded[0], 0xa0);
        assert_eq!(encoded.len(), 33);
        let decoded: H256 = Rlp::new(&encoded).as_val().unwrap();
        assert_eq!(hash, decoded);
    }

    #[test]
    fn test_yellow_paper_vectors() {
        assert_eq!(&"dog".rlp_bytes()[..], &[0x83, b'd', b'o', b'g']);
        assert_eq!(&"".rlp_bytes()[..], &[0x80]);
        assert_eq!(&0u64.rlp_bytes()[..], &[0x80]);
        assert_eq!(&15u64.rlp_bytes()[..], &[0x0f]);
        assert_eq!(&1024u64.rlp_bytes()[..], &[0x82, 0x04, 0x00]);

        let mut stream = RlpStream::new_list(2);
        stream.append(&"cat");
        stream.append(&"dog");
        assert_eq!(
            &stream.out()[..],
            &[0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
    }

    #[test]
    fn test_list_of_sender_and_nonce() {
        // The shape used for contract-address derivation
        let sender = Address::from_bytes([0x11; 20]);
        let mut stream = RlpStream::new_list(2);
        stream.append(&sender);
        stream.append(&7u64);
        let encoded = stream.out();

        let rlp = Rlp::new(&encoded);
        assert_eq!(rlp.item_count().unwrap(), 2);
        assert_eq!(rlp.val_at::<Address>(0).unwrap(), sender);
        assert_eq!(rlp.val_at::<u64>(1).unwrap(), 7);
    }

    #[test]
    fn test_decode_truncated() {
        // Claims 32 bytes but carries 10
        let truncated = vec![0xa0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        assert!(Rlp::new(&truncated).as_val::<H256>().is_err());
    }
}
