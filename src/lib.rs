//! Multisig Account: the authorization core of a multi-party-controlled account
//!
//! This crate decides, for every requested action, whether a presented
//! set of cryptographic approvals satisfies a configurable threshold
//! policy, and governs how that policy itself changes over time:
//! - Signer registry with insertion-order traversal and hinted append
//! - Aggregate signature verification (canonical strictly-ascending encoding)
//! - Self-authorized governance (threshold, add/remove/replace signers)
//! - Validate/execute pipeline with reentrancy protection
//! - Two-phase code upgrades with a same-transaction migration callback
//! - Client-side aggregate assembly and CLI tooling
//!
//! # Example
//!
//! ```rust
//! use multisig_account::{FieldElement, InMemoryHost, MultisigAccount, SignerKeyPair};
//! use multisig_account::execution::{sign_request, Call, InvokeRequest};
//! use multisig_account::host::SchnorrOracle;
//!
//! // A 2-of-3 account
//! let mut keys: Vec<SignerKeyPair> = (0..3).map(|_| SignerKeyPair::generate()).collect();
//! keys.sort_by_key(|key| key.signer_id());
//! let signers: Vec<_> = keys.iter().map(|key| key.signer_id()).collect();
//! let address = FieldElement::from_u64(0xacc);
//! let account = MultisigAccount::new(address, 2, &signers).unwrap();
//!
//! // Authorize and run a call against an external target
//! let mut host = InMemoryHost::new();
//! host.register_target(FieldElement::from_u64(0xdead), vec![FieldElement::from_u64(1)]);
//! let call = Call {
//!     target: FieldElement::from_u64(0xdead),
//!     selector: FieldElement::from_u64(7),
//!     args: vec![],
//! };
//! let mut request = InvokeRequest::new(address, vec![call]);
//! request.signatures = vec![
//!     sign_request(&request, &keys[0]).unwrap(),
//!     sign_request(&request, &keys[1]).unwrap(),
//! ];
//!
//! account.validate(&request, &SchnorrOracle).unwrap();
//! let responses = account.execute(&request, &mut host).unwrap();
//! assert_eq!(responses.len(), 1);
//! ```

pub mod account;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod execution;
pub mod host;

// Re-export commonly used types
pub use account::{
    AccountError, AccountEvent, AggregateCollector, MigrationStatus, MultisigAccount,
    SignerRegistry, SignerSignature, VerifyError, MAX_SIGNERS,
};
pub use self::core::{CodeId, FieldElement, InterfaceId, SignerId, Version, CURRENT_VERSION};
pub use crypto::SignerKeyPair;
pub use execution::{Call, DeployRequest, InvokeRequest};
pub use host::{Host, InMemoryHost, SchnorrOracle, SignatureOracle};
