//! Signer registry with insertion-order traversal
//!
//! Stores the approver set as successor links keyed by signer value,
//! plus a cached tail for O(1) append. The cache and any caller-supplied
//! hint are performance hints only: a stale or wrong hint degrades the
//! operation to a linear scan, never to a wrong answer.

use crate::core::SignerId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum number of signers a registry can hold
pub const MAX_SIGNERS: usize = 32;

/// Errors related to registry mutations
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Signer id zero is reserved")]
    ZeroSigner,
    #[error("Duplicate signer: {0}")]
    DuplicateSigner(SignerId),
    #[error("Unknown signer: {0}")]
    UnknownSigner(SignerId),
    #[error("Signer capacity exceeded: {requested} > {max}")]
    CapacityExceeded { requested: usize, max: usize },
    #[error("Cannot remove the last signer")]
    LastSignerInvariant,
}

/// Ordered set of signer identifiers.
///
/// Membership is O(1); iteration follows insertion order via the
/// successor links. `replace` relinks in place, so the replacement
/// inherits the position of the signer it replaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignerRegistry {
    /// Successor link per member; `None` marks the tail
    links: HashMap<SignerId, Option<SignerId>>,
    /// First signer in insertion order
    head: Option<SignerId>,
    /// Cached tail, possibly stale after removals
    tail_hint: Option<SignerId>,
}

impl SignerRegistry {
    /// Create a registry from an initial signer set.
    /// The set must hold between 1 and [`MAX_SIGNERS`] distinct non-zero ids.
    pub fn new(initial: &[SignerId]) -> Result<Self, RegistryError> {
        if initial.is_empty() {
            return Err(RegistryError::LastSignerInvariant);
        }
        let mut registry = Self {
            links: HashMap::new(),
            head: None,
            tail_hint: None,
        };
        registry.add(initial, None)?;
        Ok(registry)
    }

    /// Number of registered signers
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// O(1) membership test
    pub fn is_signer(&self, id: SignerId) -> bool {
        self.links.contains_key(&id)
    }

    /// Signers in insertion order
    pub fn signers(&self) -> Vec<SignerId> {
        let mut out = Vec::with_capacity(self.links.len());
        let mut cursor = self.head;
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.links.get(&id).copied().flatten();
        }
        out
    }

    /// Append signers at the tail.
    ///
    /// `after_hint` is the last-known tail; when it no longer is the
    /// tail, the append point is found by scanning from the head.
    pub fn add(&mut self, ids: &[SignerId], after_hint: Option<SignerId>) -> Result<(), RegistryError> {
        for (i, id) in ids.iter().enumerate() {
            if id.is_zero() {
                return Err(RegistryError::ZeroSigner);
            }
            if self.links.contains_key(id) || ids[..i].contains(id) {
                return Err(RegistryError::DuplicateSigner(*id));
            }
        }
        let requested = self.links.len() + ids.len();
        if requested > MAX_SIGNERS {
            return Err(RegistryError::CapacityExceeded {
                requested,
                max: MAX_SIGNERS,
            });
        }

        let mut tail = self.tail(after_hint);
        for &id in ids {
            match tail {
                Some(prev) => {
                    self.links.insert(prev, Some(id));
                }
                None => self.head = Some(id),
            }
            self.links.insert(id, None);
            tail = Some(id);
        }
        self.tail_hint = tail;
        Ok(())
    }

    /// Remove signers.
    ///
    /// Fails if any id is absent or if the registry would be emptied.
    /// `hint` is a starting point for the predecessor scan.
    pub fn remove(&mut self, ids: &[SignerId], hint: Option<SignerId>) -> Result<(), RegistryError> {
        for (i, id) in ids.iter().enumerate() {
            if !self.links.contains_key(id) || ids[..i].contains(id) {
                return Err(RegistryError::UnknownSigner(*id));
            }
        }
        if ids.len() >= self.links.len() {
            return Err(RegistryError::LastSignerInvariant);
        }

        for &id in ids {
            self.unlink(id, hint);
        }
        Ok(())
    }

    /// Swap one signer for another in a single logical step.
    ///
    /// The registry size is unchanged and `new` takes over the list
    /// position of `old`; no intermediate state is ever observable.
    pub fn replace(
        &mut self,
        old: SignerId,
        new: SignerId,
        hint: Option<SignerId>,
    ) -> Result<(), RegistryError> {
        if new.is_zero() {
            return Err(RegistryError::ZeroSigner);
        }
        if !self.links.contains_key(&old) {
            return Err(RegistryError::UnknownSigner(old));
        }
        if self.links.contains_key(&new) {
            return Err(RegistryError::DuplicateSigner(new));
        }

        let pred = if self.head == Some(old) {
            None
        } else {
            self.predecessor(old, hint)
        };
        let successor = self.links.remove(&old).flatten();
        self.links.insert(new, successor);
        match pred {
            Some(p) => {
                self.links.insert(p, Some(new));
            }
            None => self.head = Some(new),
        }
        if self.tail_hint == Some(old) {
            self.tail_hint = Some(new);
        }
        Ok(())
    }

    /// Locate the current tail, preferring valid hints over a full scan
    fn tail(&self, hint: Option<SignerId>) -> Option<SignerId> {
        for candidate in [hint, self.tail_hint] {
            if let Some(id) = candidate {
                if matches!(self.links.get(&id), Some(None)) {
                    return Some(id);
                }
            }
        }
        let mut cursor = self.head?;
        while let Some(next) = self.links.get(&cursor).copied().flatten() {
            cursor = next;
        }
        Some(cursor)
    }

    fn unlink(&mut self, id: SignerId, hint: Option<SignerId>) {
        let pred = if self.head == Some(id) {
            None
        } else {
            self.predecessor(id, hint)
        };
        let successor = self.links.remove(&id).flatten();
        match pred {
            Some(p) => {
                self.links.insert(p, successor);
            }
            None => self.head = successor,
        }
        if self.tail_hint == Some(id) {
            self.tail_hint = pred;
        }
    }

    /// Walk the links to find the predecessor of `id`, trying the hint
    /// first and falling back to a scan from the head
    fn predecessor(&self, id: SignerId, hint: Option<SignerId>) -> Option<SignerId> {
        if let Some(start) = hint.filter(|h| self.links.contains_key(h)) {
            if let Some(found) = self.scan_for_predecessor(start, id) {
                return Some(found);
            }
        }
        self.scan_for_predecessor(self.head?, id)
    }

    fn scan_for_predecessor(&self, from: SignerId, id: SignerId) -> Option<SignerId> {
        let mut cursor = from;
        loop {
            let next = self.links.get(&cursor).copied().flatten()?;
            if next == id {
                return Some(cursor);
            }
            cursor = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldElement;

    fn id(value: u64) -> SignerId {
        FieldElement::from_u64(value)
    }

    fn registry_abc() -> SignerRegistry {
        SignerRegistry::new(&[id(0xa), id(0xb), id(0xc)]).unwrap()
    }

    #[test]
    fn test_creation_and_order() {
        let registry = registry_abc();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.signers(), vec![id(0xa), id(0xb), id(0xc)]);
        assert!(registry.is_signer(id(0xb)));
        assert!(!registry.is_signer(id(0xd)));
    }

    #[test]
    fn test_creation_validation() {
        assert!(matches!(
            SignerRegistry::new(&[]),
            Err(RegistryError::LastSignerInvariant)
        ));
        assert!(matches!(
            SignerRegistry::new(&[FieldElement::ZERO]),
            Err(RegistryError::ZeroSigner)
        ));
        assert!(matches!(
            SignerRegistry::new(&[id(1), id(1)]),
            Err(RegistryError::DuplicateSigner(_))
        ));

        let too_many: Vec<SignerId> = (1..=MAX_SIGNERS as u64 + 1).map(id).collect();
        assert!(matches!(
            SignerRegistry::new(&too_many),
            Err(RegistryError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_add_preserves_order() {
        let mut registry = registry_abc();
        registry.add(&[id(0xd), id(0xe)], None).unwrap();
        assert_eq!(
            registry.signers(),
            vec![id(0xa), id(0xb), id(0xc), id(0xd), id(0xe)]
        );
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut registry = registry_abc();
        assert!(matches!(
            registry.add(&[id(0xb)], None),
            Err(RegistryError::DuplicateSigner(_))
        ));
        // Duplicate within the batch itself
        assert!(matches!(
            registry.add(&[id(0xd), id(0xd)], None),
            Err(RegistryError::DuplicateSigner(_))
        ));
        // No partial mutation from the failed calls
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_signer(id(0xd)));
    }

    #[test]
    fn test_add_with_wrong_hint_still_appends() {
        let mut registry = registry_abc();
        // Hint points at the head, not the tail
        registry.add(&[id(0xd)], Some(id(0xa))).unwrap();
        assert_eq!(registry.signers(), vec![id(0xa), id(0xb), id(0xc), id(0xd)]);

        // Hint names a value that is not even a member
        registry.add(&[id(0xe)], Some(id(0x99))).unwrap();
        assert_eq!(
            registry.signers(),
            vec![id(0xa), id(0xb), id(0xc), id(0xd), id(0xe)]
        );
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let mut registry = registry_abc();
        registry.remove(&[id(0xb)], None).unwrap();
        assert_eq!(registry.signers(), vec![id(0xa), id(0xc)]);

        let mut registry = registry_abc();
        registry.remove(&[id(0xa)], None).unwrap();
        assert_eq!(registry.signers(), vec![id(0xb), id(0xc)]);

        let mut registry = registry_abc();
        registry.remove(&[id(0xc)], None).unwrap();
        assert_eq!(registry.signers(), vec![id(0xa), id(0xb)]);
        // Appends still work after the cached tail was removed
        registry.add(&[id(0xd)], None).unwrap();
        assert_eq!(registry.signers(), vec![id(0xa), id(0xb), id(0xd)]);
    }

    #[test]
    fn test_remove_unknown_and_repeated() {
        let mut registry = registry_abc();
        assert!(matches!(
            registry.remove(&[id(0xd)], None),
            Err(RegistryError::UnknownSigner(_))
        ));
        assert!(matches!(
            registry.remove(&[id(0xa), id(0xa)], None),
            Err(RegistryError::UnknownSigner(_))
        ));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_remove_last_signer_fails() {
        let mut registry = SignerRegistry::new(&[id(1)]).unwrap();
        assert!(matches!(
            registry.remove(&[id(1)], None),
            Err(RegistryError::LastSignerInvariant)
        ));
        assert!(registry.is_signer(id(1)));

        let mut registry = registry_abc();
        assert!(matches!(
            registry.remove(&[id(0xa), id(0xb), id(0xc)], None),
            Err(RegistryError::LastSignerInvariant)
        ));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_replace_preserves_position() {
        let mut registry = registry_abc();
        registry.replace(id(0xb), id(0xd), None).unwrap();
        assert_eq!(registry.signers(), vec![id(0xa), id(0xd), id(0xc)]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_signer(id(0xb)));
    }

    #[test]
    fn test_replace_head_and_tail() {
        let mut registry = registry_abc();
        registry.replace(id(0xa), id(0xd), None).unwrap();
        assert_eq!(registry.signers(), vec![id(0xd), id(0xb), id(0xc)]);

        registry.replace(id(0xc), id(0xe), None).unwrap();
        assert_eq!(registry.signers(), vec![id(0xd), id(0xb), id(0xe)]);
        // The tail cache follows the replacement
        registry.add(&[id(0xf)], None).unwrap();
        assert_eq!(registry.signers(), vec![id(0xd), id(0xb), id(0xe), id(0xf)]);
    }

    #[test]
    fn test_replace_validation() {
        let mut registry = registry_abc();
        assert!(matches!(
            registry.replace(id(0xd), id(0xe), None),
            Err(RegistryError::UnknownSigner(_))
        ));
        assert!(matches!(
            registry.replace(id(0xa), id(0xb), None),
            Err(RegistryError::DuplicateSigner(_))
        ));
        assert!(matches!(
            registry.replace(id(0xa), FieldElement::ZERO, None),
            Err(RegistryError::ZeroSigner)
        ));
        // Replacing a signer with itself is a duplicate
        assert!(matches!(
            registry.replace(id(0xa), id(0xa), None),
            Err(RegistryError::DuplicateSigner(_))
        ));
        assert_eq!(registry.signers(), vec![id(0xa), id(0xb), id(0xc)]);
    }

    #[test]
    fn test_remove_with_hint() {
        let mut registry = registry_abc();
        // Correct predecessor hint
        registry.remove(&[id(0xc)], Some(id(0xb))).unwrap();
        assert_eq!(registry.signers(), vec![id(0xa), id(0xb)]);

        // Useless hint falls back to a head scan
        let mut registry = registry_abc();
        registry.remove(&[id(0xb)], Some(id(0xc))).unwrap();
        assert_eq!(registry.signers(), vec![id(0xa), id(0xc)]);
    }
}
