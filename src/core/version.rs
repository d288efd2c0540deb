//! Code versioning and capability introspection identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the account code in this build
pub const CURRENT_VERSION: Version = Version::new(0, 2, 0);

/// Identifies the executable logic an account is currently running.
/// Exposed read-only and passed to the upgrade callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Capability interface identifier answered by `supports_interface`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceId(pub u64);

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// The introspection interface itself (`supports_interface`)
pub const INTERFACE_ID_INTROSPECTION: InterfaceId = InterfaceId(0x01ff_c9a7);

/// The account capability interface implemented by this code
pub const INTERFACE_ID_ACCOUNT: InterfaceId = InterfaceId(0x3943_f10f);

/// Account interface shipped before 0.2.0, still answered during the
/// upgrade window
pub const INTERFACE_ID_ACCOUNT_LEGACY: InterfaceId = InterfaceId(0xf10d_a5bd);
