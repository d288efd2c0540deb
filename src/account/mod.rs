//! Multisig account core
//!
//! Provides the threshold-authorization state machine of a
//! multi-party-controlled account:
//! - Signer registry with insertion-order traversal
//! - Aggregate signature verification (canonical ascending encoding)
//! - Self-authorized governance of the registry and threshold
//! - Two-phase code upgrades with a migration callback
//! - Client-side aggregate assembly
//!
//! # Example
//!
//! ```ignore
//! use multisig_account::account::MultisigAccount;
//!
//! // Create a 2-of-3 account
//! let account = MultisigAccount::new(address, 2, &[signer_a, signer_b, signer_c])?;
//!
//! // Governance runs against the account itself
//! account.add_signers(account.address(), 3, &[signer_d], None, &mut host)?;
//! ```

pub mod account;
pub mod collector;
pub mod events;
pub mod registry;
pub mod upgrade;
pub mod verifier;

pub use account::{AccountError, MultisigAccount, ACCOUNT_NAME};
pub use collector::{AggregateCollector, CollectorError};
pub use events::AccountEvent;
pub use registry::{RegistryError, SignerRegistry, MAX_SIGNERS};
pub use upgrade::MigrationStatus;
pub use verifier::{
    assert_aggregate, assert_single_signer, verify_aggregate, SignerSignature, VerifyError,
};
