//! 2048-bit logs bloom filter.

use ledger_crypto::keccak256;

/// Logs bloom filter (2048 bits = 256 bytes)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bloom(pub [u8; 256]);

impl Default for Bloom {
    fn default() -> Self {
        Self([0u8; 256])
    }
}

impl Bloom {
    /// Empty bloom filter
    pub const ZERO: Bloom = Bloom([0u8; 256]);

    /// Create bloom from bytes
    pub fn from_bytes(bytes: [u8; 256]) -> Self {
        Self(bytes)
    }

    /// Check if the filter has no bits set
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Add data to the filter: three bits selected from the keccak of the input
    pub fn accrue(&mut self, input: &[u8]) {
        let hash = keccak256(input);
        let hash_bytes = hash.as_bytes();
        for i in 0..3 {
            let bit_index =
                ((hash_bytes[i * 2] as usize) << 8 | hash_bytes[i * 2 + 1] as usize) & 0x7FF;
            let byte_index = 255 - bit_index / 8;
            let bit_position = bit_index % 8;
            self.0[byte_index] |= 1 << bit_position;
        }
    }

    /// Check if the filter might contain the input
    pub fn contains(&self, input: &[u8]) -> bool {
        let hash = keccak256(input);
        let hash_bytes = hash.as_bytes();
        for i in 0..3 {
            let bit_index =
                ((hash_bytes[i * 2] as usize) << 8 | hash_bytes[i * 2 + 1] as usize) & 0x7FF;
            let byte_index = 255 - bit_index / 8;
            let bit_position = bit_index % 8;
            if self.0[byte_index] & (1 << bit_position) == 0 {
                return false;
            }
        }
        true
    }

    /// Merge another bloom filter into this one (bitwise OR)
    pub fn accrue_bloom(&mut self, other: &Bloom) {
        for i in 0..256 {
            self.0[i] |= other.0[i];
        }
    }
}
