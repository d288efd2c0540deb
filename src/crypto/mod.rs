//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 hashing and selector derivation
//! - Schnorr key management (secp256k1, x-only public keys)

pub mod hash;
pub mod keys;

pub use hash::{selector, sha256, sha256_hex};
pub use keys::{verify_signature, KeyError, SignerKeyPair};
