//! Account change records
//!
//! Records are facts about a completed transition, broadcast through the
//! host's event sink. They are never stored by the account itself.

use crate::core::{CodeId, FieldElement, SignerId};
use serde::{Deserialize, Serialize};

/// Events broadcast on account state changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AccountEvent {
    /// Registry or threshold changed. Lists exactly the signers added
    /// and removed by the emitting operation.
    ConfigurationChanged {
        threshold: usize,
        signer_count: usize,
        added: Vec<SignerId>,
        removed: Vec<SignerId>,
    },
    /// A validated request completed execution
    TransactionExecuted {
        hash: FieldElement,
        responses: Vec<Vec<FieldElement>>,
    },
    /// The account switched to new executable code
    AccountUpgraded { new_code: CodeId },
}
