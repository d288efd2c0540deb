//! Client-side aggregate assembly
//!
//! Gathers individual approvals in any order and produces the canonical
//! strictly-ascending aggregate that the verifier accepts.

use crate::account::registry::SignerRegistry;
use crate::account::verifier::SignerSignature;
use crate::core::{FieldElement, SignerId};
use crate::host::SignatureOracle;
use thiserror::Error;

/// Errors related to signature collection
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Not an authorized signer: {0}")]
    UnknownSigner(SignerId),
    #[error("Signer {0} already contributed")]
    AlreadySigned(SignerId),
    #[error("Signature verification failed for signer {0}")]
    InvalidSignature(SignerId),
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: usize },
}

/// Collects per-signer signatures for one message hash.
///
/// Contributions may arrive in any order; `finalize` sorts them into
/// the canonical ascending encoding and trims to exactly the threshold.
#[derive(Debug, Clone)]
pub struct AggregateCollector {
    signers: Vec<SignerId>,
    threshold: usize,
    message_hash: FieldElement,
    collected: Vec<SignerSignature>,
}

impl AggregateCollector {
    /// Start collecting against a snapshot of the registry
    pub fn new(registry: &SignerRegistry, threshold: usize, message_hash: FieldElement) -> Self {
        Self {
            signers: registry.signers(),
            threshold,
            message_hash,
            collected: Vec::new(),
        }
    }

    /// The hash contributions must sign
    pub fn message_hash(&self) -> FieldElement {
        self.message_hash
    }

    /// Accept one signer's contribution.
    ///
    /// Rejects signers outside the snapshot, repeated contributions,
    /// and signatures that do not verify.
    pub fn add_signature(
        &mut self,
        pair: SignerSignature,
        oracle: &dyn SignatureOracle,
    ) -> Result<(), CollectorError> {
        if !self.signers.contains(&pair.signer) {
            return Err(CollectorError::UnknownSigner(pair.signer));
        }
        if self.collected.iter().any(|p| p.signer == pair.signer) {
            return Err(CollectorError::AlreadySigned(pair.signer));
        }
        if !oracle.verify(&self.message_hash, pair.signer, &pair.r, &pair.s) {
            return Err(CollectorError::InvalidSignature(pair.signer));
        }
        self.collected.push(pair);
        Ok(())
    }

    /// Number of contributions collected so far
    pub fn signature_count(&self) -> usize {
        self.collected.len()
    }

    /// Whether enough contributions have arrived
    pub fn is_ready(&self) -> bool {
        self.collected.len() >= self.threshold
    }

    /// Produce the canonical aggregate: exactly `threshold` pairs in
    /// strictly ascending signer order.
    pub fn finalize(&self) -> Result<Vec<SignerSignature>, CollectorError> {
        if !self.is_ready() {
            return Err(CollectorError::InsufficientSignatures {
                have: self.collected.len(),
                need: self.threshold,
            });
        }
        let mut pairs = self.collected.clone();
        pairs.sort_by_key(|pair| pair.signer);
        pairs.truncate(self.threshold);
        Ok(pairs)
    }
}
