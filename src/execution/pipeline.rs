//! Request validation and execution
//!
//! The per-request state machine: a request is validated (structural
//! checks plus aggregate signature), then executed under a reentrancy
//! guard. Self-targeted calls route to the account's own entry points
//! with the account as caller; everything else goes to the host's call
//! dispatch. A batch either applies completely or not at all.

use crate::account::account::{AccountError, MultisigAccount};
use crate::account::events::AccountEvent;
use crate::account::registry::SignerRegistry;
use crate::account::verifier::{assert_aggregate, assert_single_signer};
use crate::core::FieldElement;
use crate::execution::request::{is_supported_version, Call, DeployRequest, InvokeRequest};
use crate::host::{Host, SignatureOracle};
use std::cell::Cell;

/// Entry point selectors for self-directed calls
pub mod selectors {
    use crate::core::FieldElement;
    use crate::crypto::selector;

    pub fn set_threshold() -> FieldElement {
        selector("set_threshold")
    }

    pub fn add_signers() -> FieldElement {
        selector("add_signers")
    }

    pub fn remove_signers() -> FieldElement {
        selector("remove_signers")
    }

    pub fn replace_signer() -> FieldElement {
        selector("replace_signer")
    }

    pub fn upgrade() -> FieldElement {
        selector("upgrade")
    }

    pub fn execute_after_upgrade() -> FieldElement {
        selector("execute_after_upgrade")
    }
}

/// Marker returned by a successful validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validated;

/// Reentrancy guard: released on every exit path, including errors
struct ExecutionGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> ExecutionGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Result<Self, AccountError> {
        if flag.replace(true) {
            return Err(AccountError::ReentrantCall);
        }
        Ok(Self { flag })
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Cursor over self-call arguments
struct CalldataReader<'a> {
    selector: FieldElement,
    args: &'a [FieldElement],
    pos: usize,
}

impl<'a> CalldataReader<'a> {
    fn new(selector: FieldElement, args: &'a [FieldElement]) -> Self {
        Self {
            selector,
            args,
            pos: 0,
        }
    }

    fn take(&mut self) -> Result<FieldElement, AccountError> {
        let value = self
            .args
            .get(self.pos)
            .copied()
            .ok_or(AccountError::InvalidCalldata(self.selector))?;
        self.pos += 1;
        Ok(value)
    }

    fn take_usize(&mut self) -> Result<usize, AccountError> {
        self.take()?
            .to_u64()
            .map(|value| value as usize)
            .ok_or(AccountError::InvalidCalldata(self.selector))
    }

    fn rest(&mut self) -> Vec<FieldElement> {
        let out = self.args[self.pos..].to_vec();
        self.pos = self.args.len();
        out
    }

    fn finish(self) -> Result<(), AccountError> {
        if self.pos != self.args.len() {
            return Err(AccountError::InvalidCalldata(self.selector));
        }
        Ok(())
    }
}

impl MultisigAccount {
    /// Pre-execution gate: structural checks plus the aggregate
    /// signature over the request hash.
    ///
    /// A single self-directed call is permitted (governance and
    /// upgrades), except for the post-upgrade migration selector.
    /// Batches of more than one call may not target the account at all.
    pub fn validate(
        &self,
        request: &InvokeRequest,
        oracle: &dyn SignatureOracle,
    ) -> Result<Validated, AccountError> {
        self.check_call_targets(&request.calls)?;
        let (registry, threshold) = {
            let state = self.state.borrow();
            (state.registry.clone(), state.threshold)
        };
        assert_aggregate(
            &registry,
            threshold,
            oracle,
            &request.hash(),
            &request.signatures,
        )?;
        Ok(Validated)
    }

    /// Run a validated request: dispatch every call in order, all or
    /// nothing.
    ///
    /// The caller is expected to have validated the request already;
    /// only the protocol version is re-asserted here. Fails with
    /// [`AccountError::ReentrantCall`] if the account's execution path
    /// is already active higher up the call stack.
    pub fn execute(
        &self,
        request: &InvokeRequest,
        host: &mut dyn Host,
    ) -> Result<Vec<Vec<FieldElement>>, AccountError> {
        if !is_supported_version(request.version) {
            return Err(AccountError::UnsupportedVersion(request.version));
        }

        let guard = ExecutionGuard::acquire(&self.executing)?;
        let responses = self.dispatch_all(&request.calls, host)?;
        drop(guard);

        host.emit(AccountEvent::TransactionExecuted {
            hash: request.hash(),
            responses: responses.clone(),
        });
        log::debug!(
            "Account {}: executed request {} ({} calls)",
            self.address(),
            request.hash(),
            request.calls.len()
        );
        Ok(responses)
    }

    /// Deploy-time validation, before any registry exists in durable
    /// storage. The signer list rides in the request itself and a
    /// single registered signer's signature suffices.
    pub fn validate_bootstrap(
        deploy: &DeployRequest,
        oracle: &dyn SignatureOracle,
    ) -> Result<Validated, AccountError> {
        Self::ensure_signer_count(deploy.signers.len())?;
        let registry = SignerRegistry::new(&deploy.signers)?;
        Self::ensure_threshold(deploy.threshold, registry.len())?;
        assert_single_signer(&deploy.signers, oracle, &deploy.hash(), &deploy.signatures)?;
        Ok(Validated)
    }

    fn check_call_targets(&self, calls: &[Call]) -> Result<(), AccountError> {
        if let [call] = calls {
            if call.target == self.address() && call.selector == selectors::execute_after_upgrade()
            {
                return Err(AccountError::ForbiddenCall);
            }
        } else if calls.iter().any(|call| call.target == self.address()) {
            return Err(AccountError::ForbiddenSelfCall);
        }
        Ok(())
    }

    fn dispatch_all(
        &self,
        calls: &[Call],
        host: &mut dyn Host,
    ) -> Result<Vec<Vec<FieldElement>>, AccountError> {
        let mut responses = Vec::with_capacity(calls.len());
        for call in calls {
            let response = if call.target == self.address() {
                self.invoke_self(call, host)?
            } else {
                host.invoke(call)?
            };
            responses.push(response);
        }
        Ok(responses)
    }

    /// Route a self-directed call to the matching entry point, with the
    /// account itself as caller
    fn invoke_self(&self, call: &Call, host: &mut dyn Host) -> Result<Vec<FieldElement>, AccountError> {
        let caller = self.address();
        let mut args = CalldataReader::new(call.selector, &call.args);

        if call.selector == selectors::set_threshold() {
            let threshold = args.take_usize()?;
            args.finish()?;
            self.set_threshold(caller, threshold, host)?;
            Ok(Vec::new())
        } else if call.selector == selectors::add_signers() {
            let threshold = args.take_usize()?;
            let ids = args.rest();
            self.add_signers(caller, threshold, &ids, None, host)?;
            Ok(Vec::new())
        } else if call.selector == selectors::remove_signers() {
            let threshold = args.take_usize()?;
            let ids = args.rest();
            self.remove_signers(caller, threshold, &ids, None, host)?;
            Ok(Vec::new())
        } else if call.selector == selectors::replace_signer() {
            let old = args.take()?;
            let new = args.take()?;
            args.finish()?;
            self.replace_signer(caller, old, new, None, host)?;
            Ok(Vec::new())
        } else if call.selector == selectors::upgrade() {
            let code = args.take()?;
            let data = args.rest();
            self.upgrade(caller, code, &data, host)?;
            Ok(Vec::new())
        } else if call.selector == selectors::execute_after_upgrade() {
            // Runs only as a direct consequence of an upgrade
            Err(AccountError::ForbiddenCall)
        } else {
            Err(AccountError::UnknownSelector(call.selector))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::MigrationStatus;
    use crate::core::{CodeId, SignerId, INTERFACE_ID_ACCOUNT};
    use crate::crypto::SignerKeyPair;
    use crate::execution::request::{sign_request, ESTIMATE_FLAG, REQUEST_VERSION};
    use crate::host::{DispatchError, InMemoryHost, SchnorrOracle};
    use std::rc::Rc;

    fn id(value: u64) -> FieldElement {
        FieldElement::from_u64(value)
    }

    /// Key pairs sorted by signer id, so indexing yields ascending order
    fn sorted_keys(count: usize) -> Vec<SignerKeyPair> {
        let mut keys: Vec<SignerKeyPair> = (0..count).map(|_| SignerKeyPair::generate()).collect();
        keys.sort_by_key(|key| key.signer_id());
        keys
    }

    fn account_with_keys(threshold: usize, keys: &[SignerKeyPair]) -> MultisigAccount {
        let signers: Vec<SignerId> = keys.iter().map(|key| key.signer_id()).collect();
        MultisigAccount::new(id(0xacc), threshold, &signers).unwrap()
    }

    fn external_call() -> Call {
        Call {
            target: id(0xdead),
            selector: id(0x5e1),
            args: vec![id(42)],
        }
    }

    #[test]
    fn test_validate_accepts_threshold_signatures() {
        let keys = sorted_keys(3);
        let account = account_with_keys(2, &keys);

        let mut request = InvokeRequest::new(account.address(), vec![external_call()]);
        request.signatures = vec![
            sign_request(&request, &keys[0]).unwrap(),
            sign_request(&request, &keys[2]).unwrap(),
        ];
        assert!(account.validate(&request, &SchnorrOracle).is_ok());
    }

    #[test]
    fn test_validate_rejects_descending_order() {
        let keys = sorted_keys(3);
        let account = account_with_keys(2, &keys);

        let mut request = InvokeRequest::new(account.address(), vec![external_call()]);
        // Individually valid signatures presented in the wrong order
        request.signatures = vec![
            sign_request(&request, &keys[2]).unwrap(),
            sign_request(&request, &keys[0]).unwrap(),
        ];
        let result = account.validate(&request, &SchnorrOracle);
        assert!(matches!(
            result,
            Err(AccountError::Verify(
                crate::account::VerifyError::SignersNotSorted
            ))
        ));
    }

    #[test]
    fn test_validate_rejects_repeated_signer() {
        let keys = sorted_keys(3);
        let account = account_with_keys(2, &keys);

        let mut request = InvokeRequest::new(account.address(), vec![external_call()]);
        request.signatures = vec![
            sign_request(&request, &keys[1]).unwrap(),
            sign_request(&request, &keys[1]).unwrap(),
        ];
        let result = account.validate(&request, &SchnorrOracle);
        assert!(matches!(
            result,
            Err(AccountError::Verify(
                crate::account::VerifyError::SignersNotSorted
            ))
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_signature_count() {
        let keys = sorted_keys(3);
        let account = account_with_keys(2, &keys);

        let mut request = InvokeRequest::new(account.address(), vec![external_call()]);
        request.signatures = vec![sign_request(&request, &keys[0]).unwrap()];
        let result = account.validate(&request, &SchnorrOracle);
        assert!(matches!(
            result,
            Err(AccountError::Verify(
                crate::account::VerifyError::InvalidSignatureLength { .. }
            ))
        ));
    }

    #[test]
    fn test_validate_allows_single_self_call() {
        let keys = sorted_keys(2);
        let account = account_with_keys(2, &keys);

        let call = Call {
            target: account.address(),
            selector: selectors::set_threshold(),
            args: vec![id(1)],
        };
        let mut request = InvokeRequest::new(account.address(), vec![call]);
        request.signatures = vec![
            sign_request(&request, &keys[0]).unwrap(),
            sign_request(&request, &keys[1]).unwrap(),
        ];
        assert!(account.validate(&request, &SchnorrOracle).is_ok());
    }

    #[test]
    fn test_validate_blocks_migration_selector() {
        let keys = sorted_keys(2);
        let account = account_with_keys(2, &keys);

        let call = Call {
            target: account.address(),
            selector: selectors::execute_after_upgrade(),
            args: vec![],
        };
        let mut request = InvokeRequest::new(account.address(), vec![call]);
        request.signatures = vec![
            sign_request(&request, &keys[0]).unwrap(),
            sign_request(&request, &keys[1]).unwrap(),
        ];
        let result = account.validate(&request, &SchnorrOracle);
        assert!(matches!(result, Err(AccountError::ForbiddenCall)));
    }

    #[test]
    fn test_validate_blocks_self_target_in_batch() {
        let keys = sorted_keys(2);
        let account = account_with_keys(2, &keys);

        let self_call = Call {
            target: account.address(),
            selector: selectors::set_threshold(),
            args: vec![id(1)],
        };
        let mut request =
            InvokeRequest::new(account.address(), vec![external_call(), self_call]);
        request.signatures = vec![
            sign_request(&request, &keys[0]).unwrap(),
            sign_request(&request, &keys[1]).unwrap(),
        ];
        let result = account.validate(&request, &SchnorrOracle);
        assert!(matches!(result, Err(AccountError::ForbiddenSelfCall)));
    }

    #[test]
    fn test_execute_dispatches_in_order() {
        let keys = sorted_keys(1);
        let account = account_with_keys(1, &keys);
        let mut host = InMemoryHost::new();
        host.register_target(id(0xdead), vec![id(7)]);
        host.register_target(id(0xbeef), vec![id(8), id(9)]);

        let calls = vec![
            Call {
                target: id(0xdead),
                selector: id(1),
                args: vec![],
            },
            Call {
                target: id(0xbeef),
                selector: id(2),
                args: vec![],
            },
        ];
        let request = InvokeRequest::new(account.address(), calls);
        let responses = account.execute(&request, &mut host).unwrap();

        assert_eq!(responses, vec![vec![id(7)], vec![id(8), id(9)]]);
        assert_eq!(
            host.events().last().unwrap().event,
            AccountEvent::TransactionExecuted {
                hash: request.hash(),
                responses,
            }
        );
    }

    #[test]
    fn test_execute_checks_protocol_version() {
        let keys = sorted_keys(1);
        let account = account_with_keys(1, &keys);
        let mut host = InMemoryHost::new();
        host.register_target(id(0xdead), vec![]);

        let mut request = InvokeRequest::new(account.address(), vec![external_call()]);
        request.version = 4;
        assert!(matches!(
            account.execute(&request, &mut host),
            Err(AccountError::UnsupportedVersion(4))
        ));

        request.version = 0;
        assert!(matches!(
            account.execute(&request, &mut host),
            Err(AccountError::UnsupportedVersion(0))
        ));

        // Fee-estimation variant of a supported version passes
        request.version = REQUEST_VERSION | ESTIMATE_FLAG;
        assert!(account.execute(&request, &mut host).is_ok());
    }

    #[test]
    fn test_execute_batch_is_all_or_nothing() {
        let keys = sorted_keys(1);
        let account = account_with_keys(1, &keys);
        let mut host = InMemoryHost::new();
        host.register_target(id(0xdead), vec![id(7)]);

        let calls = vec![
            external_call(),
            Call {
                target: id(0xffff),
                selector: id(1),
                args: vec![],
            },
        ];
        let request = InvokeRequest::new(account.address(), calls);
        let result = account.execute(&request, &mut host);
        assert!(matches!(result, Err(AccountError::Dispatch(_))));

        // The whole request failed: no execution record was broadcast
        assert!(host
            .events()
            .iter()
            .all(|record| !matches!(record.event, AccountEvent::TransactionExecuted { .. })));
    }

    #[test]
    fn test_governance_self_call_end_to_end() {
        let keys = sorted_keys(3);
        let account = account_with_keys(2, &keys);
        let mut host = InMemoryHost::new();
        let new_signer = SignerKeyPair::generate().signer_id();

        let call = Call {
            target: account.address(),
            selector: selectors::add_signers(),
            args: vec![id(3), new_signer],
        };
        let mut request = InvokeRequest::new(account.address(), vec![call]);
        request.signatures = vec![
            sign_request(&request, &keys[0]).unwrap(),
            sign_request(&request, &keys[1]).unwrap(),
        ];

        account.validate(&request, &SchnorrOracle).unwrap();
        account.execute(&request, &mut host).unwrap();

        assert_eq!(account.threshold(), 3);
        assert_eq!(account.signer_count(), 4);
        assert!(account.is_signer(new_signer));
        assert!(host.events().iter().any(|record| matches!(
            record.event,
            AccountEvent::ConfigurationChanged { threshold: 3, .. }
        )));
    }

    #[test]
    fn test_upgrade_self_call_end_to_end() {
        let keys = sorted_keys(1);
        let account = account_with_keys(1, &keys);
        let mut host = InMemoryHost::new();
        let code_v1 = id(0xc0de1);
        let code_v2 = id(0xc0de2);
        host.declare_code(code_v1, &[INTERFACE_ID_ACCOUNT]);
        host.declare_code(code_v2, &[INTERFACE_ID_ACCOUNT]);
        host.set_active_code(account.address(), code_v1).unwrap();

        let call = Call {
            target: account.address(),
            selector: selectors::upgrade(),
            args: vec![code_v2],
        };
        let mut request = InvokeRequest::new(account.address(), vec![call]);
        request.signatures = vec![sign_request(&request, &keys[0]).unwrap()];

        account.validate(&request, &SchnorrOracle).unwrap();
        account.execute(&request, &mut host).unwrap();
        assert_eq!(host.active_code(account.address()), Some(code_v2));
    }

    #[test]
    fn test_self_call_selector_errors() {
        let keys = sorted_keys(1);
        let account = account_with_keys(1, &keys);
        let mut host = InMemoryHost::new();

        let unknown = Call {
            target: account.address(),
            selector: id(0x1234),
            args: vec![],
        };
        let request = InvokeRequest::new(account.address(), vec![unknown]);
        assert!(matches!(
            account.execute(&request, &mut host),
            Err(AccountError::UnknownSelector(_))
        ));

        let malformed = Call {
            target: account.address(),
            selector: selectors::set_threshold(),
            args: vec![],
        };
        let request = InvokeRequest::new(account.address(), vec![malformed]);
        assert!(matches!(
            account.execute(&request, &mut host),
            Err(AccountError::InvalidCalldata(_))
        ));

        let trailing = Call {
            target: account.address(),
            selector: selectors::set_threshold(),
            args: vec![id(1), id(9)],
        };
        let request = InvokeRequest::new(account.address(), vec![trailing]);
        assert!(matches!(
            account.execute(&request, &mut host),
            Err(AccountError::InvalidCalldata(_))
        ));

        let migration = Call {
            target: account.address(),
            selector: selectors::execute_after_upgrade(),
            args: vec![],
        };
        let request = InvokeRequest::new(account.address(), vec![migration]);
        assert!(matches!(
            account.execute(&request, &mut host),
            Err(AccountError::ForbiddenCall)
        ));
    }

    /// Host whose dispatched call re-enters the account's execute path
    struct ReenteringHost {
        inner: InMemoryHost,
        account: Rc<MultisigAccount>,
        inner_request: InvokeRequest,
        observed: Option<AccountError>,
    }

    impl SignatureOracle for ReenteringHost {
        fn verify(
            &self,
            message_hash: &FieldElement,
            signer: SignerId,
            r: &FieldElement,
            s: &FieldElement,
        ) -> bool {
            self.inner.verify(message_hash, signer, r, s)
        }
    }

    impl Host for ReenteringHost {
        fn invoke(&mut self, call: &Call) -> Result<Vec<FieldElement>, DispatchError> {
            let account = Rc::clone(&self.account);
            let request = self.inner_request.clone();
            match account.execute(&request, self) {
                Err(err) => {
                    self.observed = Some(err);
                    Err(DispatchError::CallFailed {
                        target: call.target,
                        reason: "nested call rejected".to_string(),
                    })
                }
                Ok(_) => Ok(Vec::new()),
            }
        }

        fn active_code(&self, account: FieldElement) -> Option<CodeId> {
            self.inner.active_code(account)
        }

        fn set_active_code(
            &mut self,
            account: FieldElement,
            code: CodeId,
        ) -> Result<(), crate::host::HostError> {
            self.inner.set_active_code(account, code)
        }

        fn supports_interface(&self, code: CodeId, interface: crate::core::InterfaceId) -> bool {
            self.inner.supports_interface(code, interface)
        }

        fn emit(&mut self, event: AccountEvent) {
            self.inner.emit(event)
        }
    }

    #[test]
    fn test_reentrant_execute_is_rejected() {
        let keys = sorted_keys(1);
        let account = Rc::new(account_with_keys(1, &keys));

        let outer = InvokeRequest::new(account.address(), vec![external_call()]);
        let inner = InvokeRequest::new(
            account.address(),
            vec![Call {
                target: id(0xbeef),
                selector: id(1),
                args: vec![],
            }],
        );

        let mut host = ReenteringHost {
            inner: InMemoryHost::new(),
            account: Rc::clone(&account),
            inner_request: inner,
            observed: None,
        };

        // The nested attempt fails regardless of the inner request's
        // signature validity, and the failure aborts the outer batch
        let result = account.execute(&outer, &mut host);
        assert!(matches!(result, Err(AccountError::Dispatch(_))));
        assert!(matches!(host.observed, Some(AccountError::ReentrantCall)));

        // The guard was released on the failure path
        let mut clean = InMemoryHost::new();
        clean.register_target(id(0xdead), vec![]);
        assert!(account.execute(&outer, &mut clean).is_ok());
        assert_eq!(account.migration_status(), MigrationStatus::Settled);
    }

    #[test]
    fn test_validate_bootstrap() {
        let keys = sorted_keys(3);
        let signers: Vec<SignerId> = keys.iter().map(|key| key.signer_id()).collect();
        let mut deploy = DeployRequest {
            version: REQUEST_VERSION,
            chain_id: 1,
            code: id(0xc0de),
            salt: id(0x5a17),
            threshold: 2,
            signers: signers.clone(),
            signatures: vec![],
        };
        deploy.signatures = vec![deploy.sign(&keys[1]).unwrap()];

        assert!(MultisigAccount::validate_bootstrap(&deploy, &SchnorrOracle).is_ok());
    }

    #[test]
    fn test_validate_bootstrap_rejects_defects() {
        let keys = sorted_keys(3);
        let signers: Vec<SignerId> = keys.iter().map(|key| key.signer_id()).collect();
        let base = DeployRequest {
            version: REQUEST_VERSION,
            chain_id: 1,
            code: id(0xc0de),
            salt: id(0x5a17),
            threshold: 2,
            signers,
            signatures: vec![],
        };

        // Two signatures: the bootstrap path takes exactly one
        let mut deploy = base.clone();
        deploy.signatures = vec![deploy.sign(&keys[0]).unwrap(), deploy.sign(&keys[1]).unwrap()];
        assert!(matches!(
            MultisigAccount::validate_bootstrap(&deploy, &SchnorrOracle),
            Err(AccountError::Verify(
                crate::account::VerifyError::InvalidSignatureLength { .. }
            ))
        ));

        // Signer outside the inline list
        let outsider = SignerKeyPair::generate();
        let mut deploy = base.clone();
        deploy.signatures = vec![deploy.sign(&outsider).unwrap()];
        assert!(matches!(
            MultisigAccount::validate_bootstrap(&deploy, &SchnorrOracle),
            Err(AccountError::Verify(crate::account::VerifyError::NotASigner(_)))
        ));

        // Threshold above the signer count
        let mut deploy = base.clone();
        deploy.threshold = 9;
        deploy.signatures = vec![deploy.sign(&keys[0]).unwrap()];
        assert!(matches!(
            MultisigAccount::validate_bootstrap(&deploy, &SchnorrOracle),
            Err(AccountError::InvalidThreshold { .. })
        ));

        // Signature over the wrong deploy hash
        let mut deploy = base.clone();
        let mut other = base.clone();
        other.salt = id(0x5a18);
        deploy.signatures = vec![other.sign(&keys[0]).unwrap()];
        assert!(matches!(
            MultisigAccount::validate_bootstrap(&deploy, &SchnorrOracle),
            Err(AccountError::Verify(
                crate::account::VerifyError::SignatureMismatch(_)
            ))
        ));
    }
}
