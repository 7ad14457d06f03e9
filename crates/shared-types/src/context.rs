//! # Call Context
//!
//! The authenticated envelope around every externally invoked operation.
//! The identity subsystem verifies the caller before the context reaches
//! the marketplace, so `caller` is authoritative.

use crate::entities::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Authenticated caller plus the value attached to the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Verified caller identity.
    pub caller: Address,
    /// Value the caller attached to this call (bounty, stake, top-up).
    pub attached_value: Amount,
}

impl CallContext {
    /// A call without attached value.
    pub const fn from_caller(caller: Address) -> Self {
        Self {
            caller,
            attached_value: 0,
        }
    }

    /// Attach value to the call.
    #[must_use]
    pub const fn with_value(mut self, attached_value: Amount) -> Self {
        self.attached_value = attached_value;
        self
    }
}

impl From<Address> for CallContext {
    fn from(caller: Address) -> Self {
        Self::from_caller(caller)
    }
}
