//! Error types for the request ledger.

use crate::domain::RequestStatus;
use rb_01_value_custody::CustodyError;
use shared_types::{Address, Amount, ErrorKind, RequestId, Timestamp};
use thiserror::Error;

/// Request ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Bounty {bounty} below minimum {minimum}")]
    BountyTooLow { bounty: Amount, minimum: Amount },

    #[error("Deadline {deadline} is not after {now}")]
    DeadlineNotInFuture { deadline: Timestamp, now: Timestamp },

    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("Request not found: {0}")]
    NotFound(RequestId),

    #[error("Caller {caller:?} is not the requester of {request}")]
    NotRequester { request: RequestId, caller: Address },

    #[error("Invalid transition for {request}: cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        request: RequestId,
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("{request} already has {count} report(s)")]
    HasReports { request: RequestId, count: usize },

    #[error(transparent)]
    Custody(#[from] CustodyError),
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BountyTooLow { .. }
            | Self::DeadlineNotInFuture { .. }
            | Self::EmptyQuery
            | Self::NotFound(_) => ErrorKind::Validation,
            Self::NotRequester { .. } => ErrorKind::Authorization,
            Self::InvalidTransition { .. } | Self::HasReports { .. } => ErrorKind::State,
            Self::Custody(e) => e.kind(),
        }
    }
}

/// Result type for request ledger operations.
pub type RequestResult<T> = Result<T, RequestError>;
