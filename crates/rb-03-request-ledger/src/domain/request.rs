//! Request entity and its status transitions.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, ReportId, RequestId, Timestamp};

/// Lifecycle status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Open, no reports yet.
    Pending,
    /// At least one report submitted.
    InProgress,
    /// A report was selected and paid.
    Completed,
    /// Withdrawn by the requester before any report.
    Cancelled,
    /// A dispute was raised against the selected report.
    Disputed,
}

impl RequestStatus {
    /// Whether `self → next` is an edge of the request state machine.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Disputed)
                | (Completed, Disputed)
        )
    }

    /// Whether reports may still be submitted.
    pub fn accepts_reports(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Whether the bounty is still in custody.
    pub fn holds_bounty(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

/// A bounty-backed research request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub requester: Address,
    pub query: String,
    pub bounty: Amount,
    pub deadline: Timestamp,
    pub status: RequestStatus,
    /// Append-only, in submission order.
    pub submitted_reports: Vec<ReportId>,
    pub selected_report: Option<ReportId>,
    pub created_at: Timestamp,
}

impl Request {
    pub fn is_requester(&self, caller: &Address) -> bool {
        &self.requester == caller
    }

    pub fn deadline_passed(&self, now: Timestamp) -> bool {
        now >= self.deadline
    }
}
