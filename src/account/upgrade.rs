//! Two-phase code upgrade protocol
//!
//! `upgrade` switches the account's active code and immediately runs a
//! migration callback on the new code in the same transaction; a failed
//! callback restores the previous code before the error propagates. A
//! chained upgrade can stage a second hop in the pending slot, consumed
//! by `execute_after_upgrade`.

use crate::account::account::{AccountError, MultisigAccount};
use crate::account::events::AccountEvent;
use crate::core::{CodeId, FieldElement, Version, INTERFACE_ID_ACCOUNT};
use crate::host::Host;
use serde::{Deserialize, Serialize};

/// Progress of a code upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationStatus {
    /// No upgrade activity
    Settled,
    /// A chained upgrade staged a second code switch
    Pending(CodeId),
    /// The post-upgrade callback is in flight
    Migrating,
}

impl MultisigAccount {
    /// Switch the account to new executable code.
    ///
    /// The target must expose the account capability interface. The
    /// migration callback runs on the new code before this call returns;
    /// if it fails, the previous code is restored and the error
    /// propagates, leaving the upgrade without effect.
    pub fn upgrade(
        &self,
        caller: FieldElement,
        new_code: CodeId,
        calldata: &[FieldElement],
        host: &mut dyn Host,
    ) -> Result<(), AccountError> {
        self.ensure_self(caller)?;
        if !host.supports_interface(new_code, INTERFACE_ID_ACCOUNT) {
            return Err(AccountError::InvalidImplementation(new_code));
        }

        let previous_code = host.active_code(self.address());
        let previous_version = self.version();
        host.set_active_code(self.address(), new_code)?;

        {
            let mut state = self.state.borrow_mut();
            if state.migration == MigrationStatus::Settled {
                state.migration = MigrationStatus::Migrating;
            }
        }

        if let Err(err) = self.execute_after_upgrade(caller, previous_version, calldata, host) {
            if let Some(code) = previous_code {
                host.set_active_code(self.address(), code)?;
            }
            self.state.borrow_mut().migration = MigrationStatus::Settled;
            return Err(err);
        }

        log::info!("Account {} upgraded to code {}", self.address(), new_code);
        host.emit(AccountEvent::AccountUpgraded { new_code });
        Ok(())
    }

    /// Post-upgrade migration entry point.
    ///
    /// Reserved for the second hop of a chained upgrade: a staged
    /// pending implementation triggers one more code switch. Any other
    /// payload is rejected.
    pub fn execute_after_upgrade(
        &self,
        caller: FieldElement,
        previous_version: Version,
        data: &[FieldElement],
        host: &mut dyn Host,
    ) -> Result<Vec<FieldElement>, AccountError> {
        self.ensure_self(caller)?;
        if !data.is_empty() {
            return Err(AccountError::UnexpectedData);
        }

        let staged = {
            let mut state = self.state.borrow_mut();
            std::mem::replace(&mut state.migration, MigrationStatus::Settled)
        };
        if let MigrationStatus::Pending(next) = staged {
            host.set_active_code(self.address(), next)?;
            log::info!(
                "Account {}: chained upgrade from version {} moved on to code {}",
                self.address(),
                previous_version,
                next
            );
            host.emit(AccountEvent::AccountUpgraded { new_code: next });
        }
        Ok(Vec::new())
    }
}
