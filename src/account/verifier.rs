//! Aggregate signature verification
//!
//! An aggregate signature is an ordered list of per-signer signatures.
//! Lists must arrive sorted by strictly ascending signer value: that
//! makes the encoding canonical (exactly one valid ordering per signer
//! subset) and rejects duplicate signers without an auxiliary set.

use crate::account::registry::SignerRegistry;
use crate::core::{FieldElement, SignerId};
use crate::host::SignatureOracle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while checking an aggregate signature
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Invalid signature count: expected {expected}, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },
    #[error("Signers not in strictly ascending order")]
    SignersNotSorted,
    #[error("Not a registered signer: {0}")]
    NotASigner(SignerId),
    #[error("Signature verification failed for signer {0}")]
    SignatureMismatch(SignerId),
}

/// A single signer's contribution to an aggregate signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSignature {
    /// The approver who produced this signature
    pub signer: SignerId,
    /// Signature component r
    pub r: FieldElement,
    /// Signature component s
    pub s: FieldElement,
}

/// Strict aggregate check: every structural defect and every invalid
/// signature is an error.
///
/// The list must contain exactly `threshold` entries, in strictly
/// ascending signer order, each from a registered signer. Verification
/// stops at the first invalid signature.
pub fn assert_aggregate(
    registry: &SignerRegistry,
    threshold: usize,
    oracle: &dyn SignatureOracle,
    message_hash: &FieldElement,
    pairs: &[SignerSignature],
) -> Result<(), VerifyError> {
    if pairs.len() != threshold {
        return Err(VerifyError::InvalidSignatureLength {
            expected: threshold,
            actual: pairs.len(),
        });
    }

    let mut last = FieldElement::ZERO;
    for pair in pairs {
        if pair.signer <= last {
            return Err(VerifyError::SignersNotSorted);
        }
        if !registry.is_signer(pair.signer) {
            return Err(VerifyError::NotASigner(pair.signer));
        }
        if !oracle.verify(message_hash, pair.signer, &pair.r, &pair.s) {
            return Err(VerifyError::SignatureMismatch(pair.signer));
        }
        last = pair.signer;
    }
    Ok(())
}

/// Boolean variant: structural defects stay errors, while a signature
/// that fails to verify yields `Ok(false)` without checking the rest.
pub fn verify_aggregate(
    registry: &SignerRegistry,
    threshold: usize,
    oracle: &dyn SignatureOracle,
    message_hash: &FieldElement,
    pairs: &[SignerSignature],
) -> Result<bool, VerifyError> {
    match assert_aggregate(registry, threshold, oracle, message_hash, pairs) {
        Ok(()) => Ok(true),
        Err(VerifyError::SignatureMismatch(_)) => Ok(false),
        Err(other) => Err(other),
    }
}

/// Deploy-time check: exactly one signature, from a signer named in the
/// inline deployment list. No registry exists in durable storage yet.
pub fn assert_single_signer(
    signers: &[SignerId],
    oracle: &dyn SignatureOracle,
    message_hash: &FieldElement,
    pairs: &[SignerSignature],
) -> Result<(), VerifyError> {
    if pairs.len() != 1 {
        return Err(VerifyError::InvalidSignatureLength {
            expected: 1,
            actual: pairs.len(),
        });
    }
    let pair = &pairs[0];
    if !signers.contains(&pair.signer) {
        return Err(VerifyError::NotASigner(pair.signer));
    }
    if !oracle.verify(message_hash, pair.signer, &pair.r, &pair.s) {
        return Err(VerifyError::SignatureMismatch(pair.signer));
    }
    Ok(())
}
