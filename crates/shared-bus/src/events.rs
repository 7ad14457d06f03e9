//! # Marketplace Events
//!
//! Notifications emitted by the marketplace, grouped by topic.

use serde::{Deserialize, Serialize};
use shared_types::{Address, AgentId, Amount, ReportId, RequestId, Timestamp};

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    // =========================================================================
    // REQUEST LEDGER
    // =========================================================================
    /// A request was opened and its bounty escrowed.
    RequestCreated {
        request_id: RequestId,
        requester: Address,
        query: String,
        bounty: Amount,
        deadline: Timestamp,
    },

    /// A report-less request was cancelled and refunded.
    RequestCancelled { request_id: RequestId },

    // =========================================================================
    // REPORT LEDGER
    // =========================================================================
    ReportSubmitted {
        report_id: ReportId,
        request_id: RequestId,
        researcher: Address,
        artifact_ref: String,
    },

    /// A winner was selected; `reward` excludes the returned stake.
    ReportSelected {
        request_id: RequestId,
        report_id: ReportId,
        researcher: Address,
        reward: Amount,
    },

    DisputeRaised { report_id: ReportId, disputer: Address },

    StakeReturned {
        report_id: ReportId,
        researcher: Address,
        amount: Amount,
    },

    StakeSlashed { researcher: Address, amount: Amount },

    FeesWithdrawn { to: Address, amount: Amount },

    // =========================================================================
    // AGENT DIRECTORY
    // =========================================================================
    AgentRegistered {
        agent_id: AgentId,
        owner: Address,
        name: String,
        specialization: String,
        stake: Amount,
    },

    ReputationUpdated {
        agent_id: AgentId,
        old_score: u64,
        new_score: u64,
    },

    /// Reputation crossed the verification threshold for the first time.
    AgentVerified { agent_id: AgentId },

    AgentStakeIncreased {
        agent_id: AgentId,
        amount: Amount,
        staked: Amount,
    },

    AgentStakeWithdrawn {
        agent_id: AgentId,
        amount: Amount,
        remaining: Amount,
    },

    AgentDeactivated { agent_id: AgentId },

    AgentReactivated { agent_id: AgentId },

    AgentSlashed {
        agent_id: AgentId,
        amount: Amount,
        reputation: u64,
    },

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================
    ConfigUpdated { parameter: String, value: u128 },

    Paused { by: Address },

    Unpaused { by: Address },
}

impl MarketEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::RequestCreated { .. } | Self::RequestCancelled { .. } => EventTopic::Requests,
            Self::ReportSubmitted { .. }
            | Self::ReportSelected { .. }
            | Self::DisputeRaised { .. }
            | Self::StakeReturned { .. }
            | Self::StakeSlashed { .. } => EventTopic::Reports,
            Self::AgentRegistered { .. }
            | Self::ReputationUpdated { .. }
            | Self::AgentVerified { .. }
            | Self::AgentStakeIncreased { .. }
            | Self::AgentStakeWithdrawn { .. }
            | Self::AgentDeactivated { .. }
            | Self::AgentReactivated { .. }
            | Self::AgentSlashed { .. } => EventTopic::Agents,
            Self::FeesWithdrawn { .. }
            | Self::ConfigUpdated { .. }
            | Self::Paused { .. }
            | Self::Unpaused { .. } => EventTopic::Admin,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Request ledger events.
    Requests,
    /// Report ledger events.
    Reports,
    /// Agent directory events.
    Agents,
    /// Administrative events.
    Admin,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &MarketEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
