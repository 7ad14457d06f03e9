//! # Core Domain Entities
//!
//! Primitive aliases and identifier newtypes shared by the custody, directory
//! and ledger components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte account address, supplied by the identity subsystem.
pub type Address = [u8; 20];

/// A 32-byte hash (commitments, opaque digests).
pub type Hash = [u8; 32];

/// Value in the smallest indivisible unit.
pub type Amount = u128;

/// UNIX timestamp in seconds.
pub type Timestamp = u64;

/// Smallest units per unit of account (18 decimals).
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// The all-zero address. Never a valid administrator or recipient.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Express `numerator / denominator` units of account in smallest units.
///
/// `units(1, 100)` is 0.01 of a unit of account.
pub const fn units(numerator: Amount, denominator: Amount) -> Amount {
    numerator * UNIT / denominator
}

/// Short hex rendering of an address for log fields.
pub fn short_address(address: &Address) -> String {
    format!("0x{}", hex::encode(&address[..4]))
}

macro_rules! sequential_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// First identifier handed out by a fresh component.
            pub const FIRST: Self = Self(1);

            /// The identifier allocated after this one.
            #[must_use]
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

sequential_id!(
    /// Identifier of a research request.
    RequestId,
    "request"
);
sequential_id!(
    /// Identifier of a report submitted against a request.
    ReportId,
    "report"
);
sequential_id!(
    /// Identifier of a registered agent.
    AgentId,
    "agent"
);
