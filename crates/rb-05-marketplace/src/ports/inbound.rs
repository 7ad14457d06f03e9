//! # Inbound Ports - MarketplaceApi, MarketAdminApi
//!
//! ## Authorization
//!
//! | Method | Authorized Caller |
//! |--------|-------------------|
//! | `create_request`, `submit_report`, `register_agent` | any (not paused for the first two) |
//! | `cancel_request`, `select_report` | requester of the request |
//! | `return_stake` | researcher of the report |
//! | `raise_dispute` | requester or a researcher who submitted on the request |
//! | `increase_stake`, `withdraw_stake`, `deactivate_agent`, `reactivate_agent` | agent owner |
//! | [`MarketAdminApi`] | administrator |
//!
//! Caller identity always comes from the [`CallContext`] or `caller`
//! argument, which the identity subsystem has already authenticated.

use crate::error::MarketResult;
use async_trait::async_trait;
use rb_02_agent_directory::{AgentSlash, ReputationChange};
use rb_04_report_ledger::{NewReport, Selection, StakeSlash};
use shared_types::{Address, AgentId, Amount, CallContext, ReportId, RequestId, Timestamp};

/// Result of a winner selection, including the follow-up reputation update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionOutcome {
    pub selection: Selection,
    /// `None` when the researcher has no registered agent.
    pub reputation: Option<ReputationChange>,
}

/// Primary marketplace API.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Open a request escrowing the attached value as bounty.
    ///
    /// # Errors
    /// - `Paused`
    /// - `BountyTooLow`, `DeadlineNotInFuture`, `EmptyQuery`
    async fn create_request(
        &self,
        ctx: CallContext,
        query: String,
        deadline: Timestamp,
    ) -> MarketResult<RequestId>;

    /// Cancel a pending request without reports. Returns the refund.
    async fn cancel_request(&self, caller: Address, request_id: RequestId) -> MarketResult<Amount>;

    /// Submit a report staking the attached value.
    ///
    /// # Errors
    /// - `Paused`
    /// - `RequestStatusMismatch`, `DeadlinePassed`, `AlreadySubmitted`
    /// - `StakeTooLow`, `EmptyArtifact`
    async fn submit_report(&self, ctx: CallContext, report: NewReport) -> MarketResult<ReportId>;

    /// Select the winner and pay `reward + stake` to its researcher.
    ///
    /// `accuracy_bps` is forwarded to the researcher's agent record; values
    /// above 10000 leave the stored accuracy unchanged.
    async fn select_report(
        &self,
        caller: Address,
        request_id: RequestId,
        report_id: ReportId,
        accuracy_bps: u32,
    ) -> MarketResult<SelectionOutcome>;

    /// Reclaim the stake of a report that was not selected.
    async fn return_stake(&self, caller: Address, report_id: ReportId) -> MarketResult<Amount>;

    /// Dispute the selected report. Returns the disputed request.
    ///
    /// # Errors
    /// - `DisputeCarriesValue` if any value is attached
    async fn raise_dispute(&self, ctx: CallContext, report_id: ReportId) -> MarketResult<RequestId>;

    /// Register the caller's agent staking the attached value.
    async fn register_agent(
        &self,
        ctx: CallContext,
        name: String,
        specialization: String,
    ) -> MarketResult<AgentId>;

    /// Top up the agent's stake. Returns the new stake.
    async fn increase_stake(&self, ctx: CallContext, agent_id: AgentId) -> MarketResult<Amount>;

    /// Withdraw stake from an inactive agent. Returns the remaining stake.
    async fn withdraw_stake(
        &self,
        caller: Address,
        agent_id: AgentId,
        amount: Amount,
    ) -> MarketResult<Amount>;

    async fn deactivate_agent(&self, caller: Address, agent_id: AgentId) -> MarketResult<()>;

    async fn reactivate_agent(&self, caller: Address, agent_id: AgentId) -> MarketResult<()>;
}

/// Administrative API. Every method rejects callers other than the administrator.
#[async_trait]
pub trait MarketAdminApi: Send + Sync {
    /// Stop new requests and reports. Settlement keeps working.
    async fn pause(&self, caller: Address) -> MarketResult<()>;

    async fn unpause(&self, caller: Address) -> MarketResult<()>;

    /// # Errors
    /// - `FeeAboveCeiling` when above the configured maximum
    async fn set_fee_percent(&self, caller: Address, fee_percent: u8) -> MarketResult<()>;

    async fn set_min_bounty(&self, caller: Address, min_bounty: Amount) -> MarketResult<()>;

    async fn set_min_stake(&self, caller: Address, min_stake: Amount) -> MarketResult<()>;

    async fn set_min_agent_stake(&self, caller: Address, min_agent_stake: Amount)
        -> MarketResult<()>;

    async fn set_verification_threshold(&self, caller: Address, threshold: u64)
        -> MarketResult<()>;

    /// Forfeit a disputed report's stake to platform fees.
    async fn slash_report_stake(&self, caller: Address, report_id: ReportId)
        -> MarketResult<StakeSlash>;

    /// Burn `amount` of an agent's stake to the administrator.
    async fn slash_agent_stake(
        &self,
        caller: Address,
        agent_id: AgentId,
        amount: Amount,
    ) -> MarketResult<AgentSlash>;

    /// Deliver all accumulated fees to `to`. Returns the amount.
    async fn withdraw_fees(&self, caller: Address, to: Address) -> MarketResult<Amount>;
}
