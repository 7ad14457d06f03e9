use serde::{Deserialize, Serialize};
use shared_types::{AgentId, ReportId, RequestId};
use std::fmt;

/// A named slot of held value, keyed by the obligation it secures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustodyBucket {
    /// Bounty escrowed against an open request.
    Bounty(RequestId),
    /// Stake posted with a report.
    ReportStake(ReportId),
    /// Stake backing a registered agent.
    AgentStake(AgentId),
    /// Fees retained by the platform.
    PlatformFees,
}

impl fmt::Display for CustodyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounty(id) => write!(f, "bounty({id})"),
            Self::ReportStake(id) => write!(f, "report-stake({id})"),
            Self::AgentStake(id) => write!(f, "agent-stake({id})"),
            Self::PlatformFees => write!(f, "platform-fees"),
        }
    }
}
