//! Error types for the custody component.

use crate::domain::CustodyBucket;
use crate::ports::TransferFailure;
use shared_types::{Amount, ErrorKind};
use thiserror::Error;

/// Custody errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    /// Bucket holds less than the requested debit.
    #[error("Insufficient custody in {bucket}: have {available}, need {requested}")]
    InsufficientCustody {
        bucket: CustodyBucket,
        available: Amount,
        requested: Amount,
    },

    /// Crediting would overflow the bucket or the running total.
    #[error("Custody overflow crediting {amount} to {bucket}")]
    Overflow { bucket: CustodyBucket, amount: Amount },

    /// The external value-transfer subsystem refused the movement.
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferFailure),
}

impl CustodyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Overflow { .. } => ErrorKind::Validation,
            Self::InsufficientCustody { .. } | Self::Transfer(_) => ErrorKind::Transfer,
        }
    }
}

/// Result type for custody operations.
pub type CustodyResult<T> = Result<T, CustodyError>;
