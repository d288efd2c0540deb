//! 256-bit field values
//!
//! Signer identifiers, call targets, selectors, code identifiers, salts
//! and request hashes are all 256-bit values. Zero is reserved as the
//! absent/sentinel value and is never a valid signer or code identifier.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when parsing field values
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Invalid hex value: {0}")]
    InvalidHex(String),
    #[error("Value exceeds 32 bytes: got {0} bytes")]
    Overflow(usize),
}

/// A 256-bit value in big-endian byte order.
///
/// Ordering compares the big-endian byte strings, which is the numeric
/// order of the underlying values.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldElement([u8; 32]);

/// An approver identity (x-only public key) authorized to co-sign requests
pub type SignerId = FieldElement;

/// Reference to a deployed executable logic module
pub type CodeId = FieldElement;

impl FieldElement {
    /// The reserved sentinel value
    pub const ZERO: FieldElement = FieldElement([0u8; 32]);

    /// Wrap raw big-endian bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Lift a small integer into the field
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Narrow back to an integer, or `None` if the value does not fit
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(tail))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from a hex string, with or without a `0x` prefix.
    /// Short values are left-padded with zeros.
    pub fn from_hex(value: &str) -> Result<Self, FieldError> {
        let raw = value.strip_prefix("0x").unwrap_or(value);
        let padded = if raw.len() % 2 == 1 {
            format!("0{}", raw)
        } else {
            raw.to_string()
        };
        let decoded = hex::decode(&padded).map_err(|_| FieldError::InvalidHex(value.to_string()))?;
        if decoded.len() > 32 {
            return Err(FieldError::Overflow(decoded.len()));
        }
        let mut bytes = [0u8; 32];
        bytes[32 - decoded.len()..].copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// Full-width `0x`-prefixed hex encoding
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        FieldElement::from_hex(&value).map_err(de::Error::custom)
    }
}
