//! Error types for the report ledger.

use crate::domain::ReportStatus;
use rb_01_value_custody::CustodyError;
use rb_03_request_ledger::{RequestError, RequestStatus};
use shared_types::{Address, Amount, ErrorKind, ReportId, RequestId, Timestamp};
use thiserror::Error;

/// Report ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("Report not found: {0}")]
    NotFound(ReportId),

    #[error("Stake {stake} below minimum {minimum}")]
    StakeTooLow { stake: Amount, minimum: Amount },

    #[error("Artifact reference must not be empty")]
    EmptyArtifact,

    #[error("Deadline passed for {request}: deadline {deadline}, now {now}")]
    DeadlinePassed {
        request: RequestId,
        deadline: Timestamp,
        now: Timestamp,
    },

    #[error("Already submitted: {researcher:?} has a report on {request}")]
    AlreadySubmitted {
        request: RequestId,
        researcher: Address,
    },

    #[error("{request} is {status:?}, operation not permitted")]
    RequestStatusMismatch {
        request: RequestId,
        status: RequestStatus,
    },

    #[error("{report} does not belong to {request}")]
    ReportMismatch { report: ReportId, request: RequestId },

    #[error("Invalid transition for {report}: cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        report: ReportId,
        from: ReportStatus,
        to: ReportStatus,
    },

    #[error("Stake of {0} already settled")]
    StakeAlreadySettled(ReportId),

    #[error("Caller {caller:?} is not the requester of {request}")]
    NotRequester { request: RequestId, caller: Address },

    #[error("Caller {caller:?} is not the researcher of {report}")]
    NotResearcher { report: ReportId, caller: Address },

    #[error("Caller {caller:?} is neither requester nor submitter on {request}")]
    NotParticipant { request: RequestId, caller: Address },

    #[error("Fee {fee_percent}% exceeds ceiling {ceiling}%")]
    FeeAboveCeiling { fee_percent: u8, ceiling: u8 },

    #[error("Arithmetic overflow in fee computation")]
    ArithmeticOverflow,

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Custody(#[from] CustodyError),
}

impl ReportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_)
            | Self::StakeTooLow { .. }
            | Self::EmptyArtifact
            | Self::ReportMismatch { .. }
            | Self::FeeAboveCeiling { .. }
            | Self::ArithmeticOverflow => ErrorKind::Validation,
            Self::DeadlinePassed { .. }
            | Self::AlreadySubmitted { .. }
            | Self::RequestStatusMismatch { .. }
            | Self::InvalidTransition { .. }
            | Self::StakeAlreadySettled(_) => ErrorKind::State,
            Self::NotRequester { .. } | Self::NotResearcher { .. } | Self::NotParticipant { .. } => {
                ErrorKind::Authorization
            }
            Self::Request(e) => e.kind(),
            Self::Custody(e) => e.kind(),
        }
    }
}

/// Result type for report ledger operations.
pub type ReportResult<T> = Result<T, ReportError>;
