//! Core value types
//!
//! This module contains the fundamental building blocks:
//! - 256-bit field values (signer ids, selectors, code ids, hashes)
//! - Code versioning
//! - Capability interface identifiers

pub mod field;
pub mod version;

pub use field::{CodeId, FieldElement, FieldError, SignerId};
pub use version::{
    InterfaceId, Version, CURRENT_VERSION, INTERFACE_ID_ACCOUNT, INTERFACE_ID_ACCOUNT_LEGACY,
    INTERFACE_ID_INTROSPECTION,
};
