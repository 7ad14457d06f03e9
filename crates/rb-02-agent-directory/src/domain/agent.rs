//! Agent record.

use serde::{Deserialize, Serialize};
use shared_types::{Address, AgentId, Amount, Timestamp};

/// Upper bound of the accuracy scale (basis points).
pub const MAX_ACCURACY_BPS: u32 = 10_000;

/// Accuracy assigned at registration: 75% of scale.
pub const INITIAL_ACCURACY_BPS: u32 = MAX_ACCURACY_BPS * 3 / 4;

/// A registered research agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub owner: Address,
    pub name: String,
    pub specialization: String,
    /// Floored at zero on decrement.
    pub reputation: u64,
    pub completed_tasks: u64,
    /// Always within `0..=MAX_ACCURACY_BPS`.
    pub accuracy_bps: u32,
    /// Monotonic: false → true only.
    pub is_verified: bool,
    pub staked: Amount,
    pub is_active: bool,
    pub registered_at: Timestamp,
}

impl Agent {
    /// Apply a signed reputation delta, saturating at both ends.
    pub(crate) fn apply_reputation_delta(&mut self, delta: i64) {
        self.reputation = if delta >= 0 {
            self.reputation.saturating_add(delta.unsigned_abs())
        } else {
            self.reputation.saturating_sub(delta.unsigned_abs())
        };
    }

    /// Flip verification if the threshold is met. Returns true on the flip.
    pub(crate) fn check_verification(&mut self, threshold: u64) -> bool {
        if !self.is_verified && self.reputation >= threshold {
            self.is_verified = true;
            return true;
        }
        false
    }
}
