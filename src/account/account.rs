//! Multisig account state and governance
//!
//! The account holds the signer registry, the approval threshold, and
//! the migration status of an in-flight upgrade. Governance entry points
//! are self-authorized: they can only run as part of a request the
//! account has validated and is executing against itself.

use crate::account::events::AccountEvent;
use crate::account::registry::{RegistryError, SignerRegistry, MAX_SIGNERS};
use crate::account::upgrade::MigrationStatus;
use crate::account::verifier::VerifyError;
use crate::core::{
    CodeId, FieldElement, InterfaceId, SignerId, Version, CURRENT_VERSION, INTERFACE_ID_ACCOUNT,
    INTERFACE_ID_ACCOUNT_LEGACY, INTERFACE_ID_INTROSPECTION,
};
use crate::host::{DispatchError, Host, HostError};
use std::cell::{Cell, RefCell};
use thiserror::Error;

/// Name reported by the `name()` query
pub const ACCOUNT_NAME: &str = "MultisigAccount";

/// Errors related to account operations
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Caller is not the account itself")]
    OnlySelfAllowed,
    #[error("Invalid threshold {threshold} for {count} signers")]
    InvalidThreshold { threshold: usize, count: usize },
    #[error("Invalid signer count: {count}")]
    InvalidSignerCount { count: usize },
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Signature error: {0}")]
    Verify(#[from] VerifyError),
    #[error("Unsupported protocol version: {0:#x}")]
    UnsupportedVersion(u64),
    #[error("Selector may only run as a direct consequence of an upgrade")]
    ForbiddenCall,
    #[error("Multicall batches may not target the account itself")]
    ForbiddenSelfCall,
    #[error("Account execution already in progress")]
    ReentrantCall,
    #[error("Unknown selector: {0}")]
    UnknownSelector(FieldElement),
    #[error("Malformed calldata for selector {0}")]
    InvalidCalldata(FieldElement),
    #[error("Implementation {0} does not expose the account interface")]
    InvalidImplementation(CodeId),
    #[error("Unexpected migration data")]
    UnexpectedData,
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// Durable account state, mutated only by governance and upgrade
/// entry points
#[derive(Debug, Clone)]
pub(crate) struct AccountState {
    pub(crate) registry: SignerRegistry,
    pub(crate) threshold: usize,
    pub(crate) migration: MigrationStatus,
}

/// A multi-party-controlled account.
///
/// State sits behind a `RefCell` so entry points take `&self`: the host
/// re-enters through shared handles guarded by the reentrancy lock, not
/// through Rust's borrow system. Borrows are never held across host
/// calls.
#[derive(Debug)]
pub struct MultisigAccount {
    address: FieldElement,
    version: Version,
    pub(crate) state: RefCell<AccountState>,
    pub(crate) executing: Cell<bool>,
}

impl MultisigAccount {
    /// Create an account with its initial signer set and threshold.
    ///
    /// Fails unless `1 <= threshold <= |signers| <= 32` with distinct
    /// non-zero signer ids.
    pub fn new(
        address: FieldElement,
        threshold: usize,
        signers: &[SignerId],
    ) -> Result<Self, AccountError> {
        Self::ensure_signer_count(signers.len())?;
        let registry = SignerRegistry::new(signers)?;
        Self::ensure_threshold(threshold, registry.len())?;
        Ok(Self {
            address,
            version: CURRENT_VERSION,
            state: RefCell::new(AccountState {
                registry,
                threshold,
                migration: MigrationStatus::Settled,
            }),
            executing: Cell::new(false),
        })
    }

    /// The account's own address
    pub fn address(&self) -> FieldElement {
        self.address
    }

    pub fn name(&self) -> &'static str {
        ACCOUNT_NAME
    }

    /// Version of the currently running code
    pub fn version(&self) -> Version {
        self.version
    }

    /// Current approval threshold
    pub fn threshold(&self) -> usize {
        self.state.borrow().threshold
    }

    pub fn signer_count(&self) -> usize {
        self.state.borrow().registry.len()
    }

    /// Registered signers in insertion order
    pub fn signers(&self) -> Vec<SignerId> {
        self.state.borrow().registry.signers()
    }

    pub fn is_signer(&self, id: SignerId) -> bool {
        self.state.borrow().registry.is_signer(id)
    }

    /// Progress of an in-flight two-phase upgrade
    pub fn migration_status(&self) -> MigrationStatus {
        self.state.borrow().migration
    }

    /// Capability introspection: answers for the introspection interface
    /// and for the current and one legacy account interface
    pub fn supports_interface(&self, interface: InterfaceId) -> bool {
        interface == INTERFACE_ID_INTROSPECTION
            || interface == INTERFACE_ID_ACCOUNT
            || interface == INTERFACE_ID_ACCOUNT_LEGACY
    }

    /// Change the approval threshold.
    pub fn set_threshold(
        &self,
        caller: FieldElement,
        new_threshold: usize,
        host: &mut dyn Host,
    ) -> Result<(), AccountError> {
        self.ensure_self(caller)?;
        let record = {
            let mut state = self.state.borrow_mut();
            Self::ensure_threshold(new_threshold, state.registry.len())?;
            state.threshold = new_threshold;
            AccountEvent::ConfigurationChanged {
                threshold: new_threshold,
                signer_count: state.registry.len(),
                added: vec![],
                removed: vec![],
            }
        };
        log::info!("Account {}: threshold set to {}", self.address, new_threshold);
        host.emit(record);
        Ok(())
    }

    /// Add signers and move to a new threshold in one step.
    pub fn add_signers(
        &self,
        caller: FieldElement,
        new_threshold: usize,
        ids: &[SignerId],
        after_hint: Option<SignerId>,
        host: &mut dyn Host,
    ) -> Result<(), AccountError> {
        self.ensure_self(caller)?;
        let record = {
            let mut state = self.state.borrow_mut();
            // Mutate a scratch copy; commit only a proven-valid combination
            let mut registry = state.registry.clone();
            registry.add(ids, after_hint)?;
            Self::ensure_threshold(new_threshold, registry.len())?;
            state.registry = registry;
            state.threshold = new_threshold;
            AccountEvent::ConfigurationChanged {
                threshold: new_threshold,
                signer_count: state.registry.len(),
                added: ids.to_vec(),
                removed: vec![],
            }
        };
        log::info!(
            "Account {}: added {} signer(s), threshold now {}",
            self.address,
            ids.len(),
            new_threshold
        );
        host.emit(record);
        Ok(())
    }

    /// Remove signers and move to a new threshold in one step.
    pub fn remove_signers(
        &self,
        caller: FieldElement,
        new_threshold: usize,
        ids: &[SignerId],
        hint: Option<SignerId>,
        host: &mut dyn Host,
    ) -> Result<(), AccountError> {
        self.ensure_self(caller)?;
        let record = {
            let mut state = self.state.borrow_mut();
            Self::ensure_signer_count(state.registry.len().saturating_sub(ids.len()))?;
            let mut registry = state.registry.clone();
            registry.remove(ids, hint)?;
            Self::ensure_threshold(new_threshold, registry.len())?;
            state.registry = registry;
            state.threshold = new_threshold;
            AccountEvent::ConfigurationChanged {
                threshold: new_threshold,
                signer_count: state.registry.len(),
                added: vec![],
                removed: ids.to_vec(),
            }
        };
        log::info!(
            "Account {}: removed {} signer(s), threshold now {}",
            self.address,
            ids.len(),
            new_threshold
        );
        host.emit(record);
        Ok(())
    }

    /// Swap one signer for another. Atomic: the registry size and the
    /// threshold are unchanged, and no intermediate state is observable.
    pub fn replace_signer(
        &self,
        caller: FieldElement,
        old: SignerId,
        new: SignerId,
        hint: Option<SignerId>,
        host: &mut dyn Host,
    ) -> Result<(), AccountError> {
        self.ensure_self(caller)?;
        let record = {
            let mut state = self.state.borrow_mut();
            let mut registry = state.registry.clone();
            registry.replace(old, new, hint)?;
            state.registry = registry;
            AccountEvent::ConfigurationChanged {
                threshold: state.threshold,
                signer_count: state.registry.len(),
                added: vec![new],
                removed: vec![old],
            }
        };
        log::info!("Account {}: replaced signer {} with {}", self.address, old, new);
        host.emit(record);
        Ok(())
    }

    pub(crate) fn ensure_self(&self, caller: FieldElement) -> Result<(), AccountError> {
        if caller != self.address {
            return Err(AccountError::OnlySelfAllowed);
        }
        Ok(())
    }

    pub(crate) fn ensure_threshold(threshold: usize, count: usize) -> Result<(), AccountError> {
        if threshold == 0 || threshold > count {
            return Err(AccountError::InvalidThreshold { threshold, count });
        }
        Ok(())
    }

    pub(crate) fn ensure_signer_count(count: usize) -> Result<(), AccountError> {
        if count == 0 || count > MAX_SIGNERS {
            return Err(AccountError::InvalidSignerCount { count });
        }
        Ok(())
    }
}
