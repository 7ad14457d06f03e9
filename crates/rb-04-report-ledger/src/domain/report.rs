use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, Hash, ReportId, RequestId, Timestamp};

/// Lifecycle status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    Submitted,
    Selected,
    Rejected,
    Disputed,
}

impl ReportStatus {
    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, next),
            (Submitted, Selected) | (Selected, Disputed) | (Disputed, Rejected)
        )
    }
}

/// A staked report against a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub researcher: Address,
    /// Weak reference; the request ledger owns the request.
    pub request_id: RequestId,
    /// Opaque reference into the off-chain artifact store.
    pub artifact_ref: String,
    pub commitment: Hash,
    /// Stake still in custody. Zero once returned, paid out or slashed.
    pub stake: Amount,
    pub status: ReportStatus,
    pub created_at: Timestamp,
}

impl Report {
    /// Zero the stake field and hand back what it held.
    ///
    /// Returns `None` if the stake was already settled.
    pub fn take_stake(&mut self) -> Option<Amount> {
        match std::mem::take(&mut self.stake) {
            0 => None,
            stake => Some(stake),
        }
    }
}
