//! In-memory host used by tests and the demo
//!
//! A HashMap-backed stand-in for the host ledger: a code store with
//! declared interfaces, canned external call targets, and a timestamped
//! event log.

use crate::account::events::AccountEvent;
use crate::core::{CodeId, FieldElement, InterfaceId, SignerId};
use crate::execution::request::Call;
use crate::host::{DispatchError, Host, HostError, SchnorrOracle, SignatureOracle};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A deployed code module and the interfaces it answers to
#[derive(Debug, Clone, Default)]
pub struct CodeModule {
    pub interfaces: HashSet<InterfaceId>,
}

/// A broadcast event together with when it was observed
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub emitted_at: DateTime<Utc>,
    pub event: AccountEvent,
}

/// In-memory host ledger
#[derive(Debug, Default)]
pub struct InMemoryHost {
    /// Deployed code modules by identifier
    codes: HashMap<CodeId, CodeModule>,
    /// Active code per account address
    active: HashMap<FieldElement, CodeId>,
    /// External call targets with canned responses
    targets: HashMap<FieldElement, Vec<FieldElement>>,
    /// Calls dispatched so far
    invocations: Vec<Call>,
    /// Broadcast log
    events: Vec<EventRecord>,
    oracle: SchnorrOracle,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a code module and the interfaces it supports
    pub fn declare_code(&mut self, code: CodeId, interfaces: &[InterfaceId]) {
        self.codes.insert(
            code,
            CodeModule {
                interfaces: interfaces.iter().copied().collect(),
            },
        );
    }

    /// Register an external call target with a canned response
    pub fn register_target(&mut self, target: FieldElement, response: Vec<FieldElement>) {
        self.targets.insert(target, response);
    }

    /// Events broadcast so far, oldest first
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Calls dispatched so far, in order
    pub fn invocations(&self) -> &[Call] {
        &self.invocations
    }
}

impl SignatureOracle for InMemoryHost {
    fn verify(
        &self,
        message_hash: &FieldElement,
        signer: SignerId,
        r: &FieldElement,
        s: &FieldElement,
    ) -> bool {
        self.oracle.verify(message_hash, signer, r, s)
    }
}

impl Host for InMemoryHost {
    fn invoke(&mut self, call: &Call) -> Result<Vec<FieldElement>, DispatchError> {
        let response = self
            .targets
            .get(&call.target)
            .cloned()
            .ok_or(DispatchError::UnknownTarget(call.target))?;
        self.invocations.push(call.clone());
        log::debug!("Dispatched call to {} ({})", call.target, call.selector);
        Ok(response)
    }

    fn active_code(&self, account: FieldElement) -> Option<CodeId> {
        self.active.get(&account).copied()
    }

    fn set_active_code(&mut self, account: FieldElement, code: CodeId) -> Result<(), HostError> {
        if !self.codes.contains_key(&code) {
            return Err(HostError::InvalidCode(code));
        }
        self.active.insert(account, code);
        log::debug!("Account {} now runs code {}", account, code);
        Ok(())
    }

    fn supports_interface(&self, code: CodeId, interface: InterfaceId) -> bool {
        self.codes
            .get(&code)
            .map(|module| module.interfaces.contains(&interface))
            .unwrap_or(false)
    }

    fn emit(&mut self, event: AccountEvent) {
        // Fire and forget: nobody acknowledges broadcasts
        self.events.push(EventRecord {
            emitted_at: Utc::now(),
            event,
        });
    }
}
