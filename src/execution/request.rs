//! Request types and canonical hashing
//!
//! An inbound request carries a protocol version, a call list and an
//! aggregate signature over the request hash. The hash covers the chain
//! id and the account address for replay protection (EIP-155 style).

use crate::account::verifier::SignerSignature;
use crate::core::{CodeId, FieldElement, SignerId};
use crate::crypto::{sha256, KeyError, SignerKeyPair};
use serde::{Deserialize, Serialize};

// =============================================================================
// Constants
// =============================================================================

/// Current request protocol version
pub const REQUEST_VERSION: u64 = 3;

/// Default chain ID (for replay protection)
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Flag bit marking the fee-estimation variant of a protocol version
pub const ESTIMATE_FLAG: u64 = 1 << 63;

/// Protocol versions the pipeline accepts, besides their
/// fee-estimation variants
pub const SUPPORTED_VERSIONS: [u64; 3] = [1, 2, 3];

/// Check whether a declared version is supported, including the
/// fee-estimation variants
pub fn is_supported_version(version: u64) -> bool {
    SUPPORTED_VERSIONS.contains(&(version & !ESTIMATE_FLAG))
}

fn default_version() -> u64 {
    REQUEST_VERSION
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

// =============================================================================
// Calls
// =============================================================================

/// A single call in a request batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Account or contract being called
    pub target: FieldElement,
    /// Entry point selector on the target
    pub selector: FieldElement,
    /// Call arguments
    #[serde(default)]
    pub args: Vec<FieldElement>,
}

// =============================================================================
// Invoke Request
// =============================================================================

/// An inbound execution request carrying its aggregate signature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    #[serde(default = "default_version")]
    pub version: u64,
    /// Chain ID for replay protection
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// The account the request is addressed to
    pub account: FieldElement,
    /// Calls to dispatch, in order
    pub calls: Vec<Call>,
    /// Aggregate signature over the request hash
    #[serde(default)]
    pub signatures: Vec<SignerSignature>,
}

impl InvokeRequest {
    /// Create an unsigned request at the current protocol version
    pub fn new(account: FieldElement, calls: Vec<Call>) -> Self {
        Self {
            version: REQUEST_VERSION,
            chain_id: DEFAULT_CHAIN_ID,
            account,
            calls,
            signatures: Vec::new(),
        }
    }

    /// Whether this is a fee-estimation variant
    pub fn is_fee_estimate(&self) -> bool {
        self.version & ESTIMATE_FLAG != 0
    }

    /// Canonical hash covering everything the account reads except the
    /// signatures themselves
    pub fn hash(&self) -> FieldElement {
        let mut data = Vec::new();
        data.extend_from_slice(&self.chain_id.to_be_bytes());
        data.extend_from_slice(self.account.as_bytes());
        data.extend_from_slice(&self.version.to_be_bytes());
        data.extend_from_slice(&(self.calls.len() as u64).to_be_bytes());
        for call in &self.calls {
            data.extend_from_slice(call.target.as_bytes());
            data.extend_from_slice(call.selector.as_bytes());
            data.extend_from_slice(&(call.args.len() as u64).to_be_bytes());
            for arg in &call.args {
                data.extend_from_slice(arg.as_bytes());
            }
        }
        FieldElement::from_bytes(sha256(&data))
    }
}

/// Produce one signer's contribution for a request
pub fn sign_request(
    request: &InvokeRequest,
    key: &SignerKeyPair,
) -> Result<SignerSignature, KeyError> {
    let (r, s) = key.sign(&request.hash())?;
    Ok(SignerSignature {
        signer: key.signer_id(),
        r,
        s,
    })
}

// =============================================================================
// Deploy Request
// =============================================================================

/// A deployment request. The signer set rides inline because no
/// registry exists in durable storage yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRequest {
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Code the account will run
    pub code: CodeId,
    /// Deployment salt
    pub salt: FieldElement,
    /// Initial approval threshold
    pub threshold: usize,
    /// Initial signer set, in registry insertion order
    pub signers: Vec<SignerId>,
    /// Single-signer bootstrap signature over the deploy hash
    #[serde(default)]
    pub signatures: Vec<SignerSignature>,
}

impl DeployRequest {
    /// Canonical hash binding the deployment parameters
    pub fn hash(&self) -> FieldElement {
        let mut data = Vec::new();
        data.extend_from_slice(&self.chain_id.to_be_bytes());
        data.extend_from_slice(self.code.as_bytes());
        data.extend_from_slice(self.salt.as_bytes());
        data.extend_from_slice(&self.version.to_be_bytes());
        data.extend_from_slice(&(self.threshold as u64).to_be_bytes());
        data.extend_from_slice(&(self.signers.len() as u64).to_be_bytes());
        for signer in &self.signers {
            data.extend_from_slice(signer.as_bytes());
        }
        FieldElement::from_bytes(sha256(&data))
    }

    /// Deterministic account address for this deployment
    pub fn account_address(&self) -> FieldElement {
        let mut data = Vec::new();
        data.extend_from_slice(b"account-address");
        data.extend_from_slice(self.code.as_bytes());
        data.extend_from_slice(self.salt.as_bytes());
        data.extend_from_slice(&(self.threshold as u64).to_be_bytes());
        for signer in &self.signers {
            data.extend_from_slice(signer.as_bytes());
        }
        FieldElement::from_bytes(sha256(&data))
    }

    /// Produce the bootstrap signature for a deployment
    pub fn sign(&self, key: &SignerKeyPair) -> Result<SignerSignature, KeyError> {
        let (r, s) = key.sign(&self.hash())?;
        Ok(SignerSignature {
            signer: key.signer_id(),
            r,
            s,
        })
    }
}
