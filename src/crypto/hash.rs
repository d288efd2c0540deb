//! Cryptographic hashing utilities
//!
//! Provides SHA-256 based hashing used for request hashes and entry
//! point selector derivation.

use crate::core::FieldElement;
use sha2::{Digest, Sha256};

/// Computes the SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes the SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Derives the selector for an entry point name
pub fn selector(name: &str) -> FieldElement {
    FieldElement::from_bytes(sha256(name.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        let hash = sha256(data);
        assert_eq!(hash.len(), 32);
        assert_eq!(
            sha256_hex(data),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_selector_deterministic() {
        assert_eq!(selector("upgrade"), selector("upgrade"));
        assert_ne!(selector("upgrade"), selector("set_threshold"));
        assert!(!selector("upgrade").is_zero());
    }
}
