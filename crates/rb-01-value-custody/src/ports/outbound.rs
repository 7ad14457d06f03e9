//! Driven Ports (SPI - Outbound Dependencies)

use shared_types::{Address, Amount};
use thiserror::Error;

/// Why the value-transfer subsystem could not move value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferFailure {
    /// Source wallet cannot cover the collection.
    #[error("insufficient funds at {address:?}: have {available}, need {requested}")]
    InsufficientFunds {
        address: Address,
        available: Amount,
        requested: Amount,
    },

    /// Destination refused receipt.
    #[error("destination {address:?} rejected receipt: {reason}")]
    Rejected { address: Address, reason: String },
}

/// Atomic value movement between external wallets and custody.
///
/// Both calls are all-or-nothing: on `Err` no value has moved.
///
/// Implementations may run recipient code inside `deliver` (the one point
/// where control leaves the marketplace), so callers must have committed
/// their own bookkeeping before invoking it.
pub trait ValueTransferGateway: Send + Sync {
    /// Pull `amount` from `from` into custody.
    fn collect(&self, from: Address, amount: Amount) -> Result<(), TransferFailure>;

    /// Push `amount` out of custody to `to`.
    fn deliver(&self, to: Address, amount: Amount) -> Result<(), TransferFailure>;
}
