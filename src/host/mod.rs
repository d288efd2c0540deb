//! Host-side collaborators
//!
//! The account consumes four primitives from its host ledger: signature
//! verification, call dispatch, code replacement, and event broadcast.
//! They are modeled as traits so every one of them can be substituted
//! in tests.

pub mod memory;

pub use memory::{CodeModule, EventRecord, InMemoryHost};

use crate::account::events::AccountEvent;
use crate::core::{CodeId, FieldElement, InterfaceId, SignerId};
use crate::execution::request::Call;
use thiserror::Error;

/// Errors raised by the host's call dispatch
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown call target: {0}")]
    UnknownTarget(FieldElement),
    #[error("Call to {target} failed: {reason}")]
    CallFailed {
        target: FieldElement,
        reason: String,
    },
}

/// Errors raised by the host's code store
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Invalid code identifier: {0}")]
    InvalidCode(CodeId),
}

/// The elliptic-curve signature primitive, treated as a trusted oracle:
/// `verify(hash, pubkey, r, s) -> bool`
pub trait SignatureOracle {
    fn verify(
        &self,
        message_hash: &FieldElement,
        signer: SignerId,
        r: &FieldElement,
        s: &FieldElement,
    ) -> bool;
}

/// Everything the account asks of its host ledger
pub trait Host: SignatureOracle {
    /// Dispatch a call to an external target
    fn invoke(&mut self, call: &Call) -> Result<Vec<FieldElement>, DispatchError>;

    /// Code currently active for an account address
    fn active_code(&self, account: FieldElement) -> Option<CodeId>;

    /// Replace an account's active code
    fn set_active_code(&mut self, account: FieldElement, code: CodeId) -> Result<(), HostError>;

    /// Capability introspection on a deployed code module
    fn supports_interface(&self, code: CodeId, interface: InterfaceId) -> bool;

    /// Fire-and-forget broadcast of a state change record
    fn emit(&mut self, event: AccountEvent);
}

/// Oracle backed by the crate's Schnorr primitive
#[derive(Debug, Clone, Copy, Default)]
pub struct SchnorrOracle;

impl SignatureOracle for SchnorrOracle {
    fn verify(
        &self,
        message_hash: &FieldElement,
        signer: SignerId,
        r: &FieldElement,
        s: &FieldElement,
    ) -> bool {
        crate::crypto::verify_signature(signer, message_hash, r, s)
    }
}
