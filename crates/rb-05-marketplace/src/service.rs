//! # Marketplace Service
//!
//! Implements [`MarketplaceApi`] and [`MarketAdminApi`] over a single
//! [`MarketState`].
//!
//! ## Atomicity
//!
//! Each operation runs against a clone of the committed state. The clone is
//! committed only when the operation returns `Ok`; on `Err` it is dropped, so
//! a failed value transfer leaves no trace in any ledger.
//!
//! ## Re-entrancy
//!
//! Value deliveries are staged while the operation runs and sent only once the
//! working copy has reached its final state. During delivery that copy is
//! parked in `staged`, so views called by the recipient already show the
//! outcome (a paid stake reads as zero, a selected request as Completed).
//!
//! The state sits behind a re-entrant mutex so that a recipient running inside
//! a value delivery on the same thread can still take the lock. It then finds
//! the in-flight flag set and its mutating call fails with
//! [`MarketError::ReentrantCall`]. Calls from other threads simply wait.

use crate::config::MarketConfig;
use crate::error::{MarketError, MarketResult};
use crate::ports::{MarketAdminApi, MarketplaceApi, SelectionOutcome};
use crate::state::MarketState;
use async_trait::async_trait;
use parking_lot::ReentrantMutex;
use rb_01_value_custody::{deliver, ValueTransferGateway};
use rb_02_agent_directory::{Agent, AgentSlash, ReputationCapability, ReputationChange};
use rb_03_request_ledger::{NewRequest, Request};
use rb_04_report_ledger::{NewReport, Report, StakeSlash};
use shared_bus::{EventPublisher, MarketEvent};
use shared_types::{
    short_address, Address, AgentId, Amount, CallContext, ReportId, RequestId, TimeSource,
    Timestamp, ZERO_ADDRESS,
};
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

struct Shared {
    committed: RefCell<MarketState>,
    /// Final state of the in-flight operation while its deliveries run.
    staged: RefCell<Option<MarketState>>,
    in_flight: Cell<bool>,
}

/// Clears the in-flight flag however the operation ends.
struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// The marketplace facade.
pub struct MarketplaceService<P: EventPublisher, C: TimeSource> {
    shared: ReentrantMutex<Shared>,
    /// Bound once at construction, never handed out.
    capability: ReputationCapability,
    publisher: Arc<P>,
    clock: Arc<C>,
}

impl<P: EventPublisher, C: TimeSource> MarketplaceService<P, C> {
    /// Build the components from `config` and bind the directory capability.
    pub fn new(
        config: MarketConfig,
        gateway: Arc<dyn ValueTransferGateway>,
        publisher: Arc<P>,
        clock: Arc<C>,
    ) -> MarketResult<Self> {
        let mut state = MarketState::new(&config, gateway)?;
        let capability = state.directory.bind_marketplace()?;

        info!(
            admin = %short_address(&config.admin),
            fee_percent = config.fee_percent,
            min_bounty = config.min_bounty,
            min_stake = config.min_stake,
            "Marketplace initialized"
        );
        Ok(Self {
            shared: ReentrantMutex::new(Shared {
                committed: RefCell::new(state),
                staged: RefCell::new(None),
                in_flight: Cell::new(false),
            }),
            capability,
            publisher,
            clock,
        })
    }

    // =========================================================================
    // VIEWS (last committed state)
    // =========================================================================

    pub fn request(&self, id: RequestId) -> Option<Request> {
        self.read(|s| s.requests.request(id).cloned())
    }

    pub fn report(&self, id: ReportId) -> Option<Report> {
        self.read(|s| s.reports.report(id).cloned())
    }

    pub fn reports_for(&self, request_id: RequestId) -> Vec<Report> {
        self.read(|s| s.reports.reports_for(request_id).into_iter().cloned().collect())
    }

    pub fn has_submitted(&self, request_id: RequestId, researcher: &Address) -> bool {
        self.read(|s| s.reports.has_submitted(request_id, researcher))
    }

    pub fn researcher_reputation(&self, researcher: &Address) -> u64 {
        self.read(|s| s.reports.researcher_reputation(researcher))
    }

    pub fn agent(&self, id: AgentId) -> Option<Agent> {
        self.read(|s| s.directory.agent(id).cloned())
    }

    pub fn agent_of(&self, owner: &Address) -> Option<Agent> {
        self.read(|s| s.directory.agent_of(owner).cloned())
    }

    pub fn accumulated_fees(&self) -> Amount {
        self.read(MarketState::accumulated_fees)
    }

    pub fn total_held(&self) -> Amount {
        self.read(|s| s.custody.total_held())
    }

    pub fn fee_percent(&self) -> u8 {
        self.read(|s| s.reports.policy().fee_percent())
    }

    pub fn is_paused(&self) -> bool {
        self.read(MarketState::is_paused)
    }

    /// Copy of the whole committed state.
    pub fn snapshot(&self) -> MarketState {
        self.read(MarketState::clone)
    }

    fn read<R>(&self, f: impl FnOnce(&MarketState) -> R) -> R {
        let shared = self.shared.lock();
        let staged = shared.staged.borrow();
        match staged.as_ref() {
            Some(state) => f(state),
            None => f(&shared.committed.borrow()),
        }
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// Run `f` on a working copy and commit it on success.
    fn transact<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut MarketState) -> MarketResult<(T, Vec<MarketEvent>)>,
    ) -> MarketResult<(T, Vec<MarketEvent>)> {
        let shared = self.shared.lock();
        if shared.in_flight.replace(true) {
            warn!(operation, "Re-entrant call refused");
            return Err(MarketError::ReentrantCall { operation });
        }
        let _in_flight = InFlight(&shared.in_flight);

        let mut working = shared.committed.borrow().clone();
        working.custody.defer_deliveries();
        let outcome = match f(&mut working) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(operation, error = %e, kind = ?e.kind(), "Rolled back");
                return Err(e);
            }
        };
        debug_assert!(working.is_consistent(), "custody drifted from ledgers");

        let deliveries = working.custody.take_deliveries();
        let gateway = working.custody.gateway();
        *shared.staged.borrow_mut() = Some(working);
        let settled = deliveries
            .into_iter()
            .try_for_each(|delivery| deliver(gateway.as_ref(), delivery));
        let staged = shared.staged.take();

        if let Err(e) = settled {
            let e = MarketError::from(e);
            debug!(operation, error = %e, kind = ?e.kind(), "Rolled back");
            return Err(e);
        }
        if let Some(state) = staged {
            *shared.committed.borrow_mut() = state;
        }
        debug!(operation, "Committed");
        Ok(outcome)
    }

    /// Commit, then publish.
    async fn run<T: Send>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut MarketState) -> MarketResult<(T, Vec<MarketEvent>)> + Send,
    ) -> MarketResult<T> {
        let (value, events) = self.transact(operation, f)?;
        self.publish(events).await;
        Ok(value)
    }

    async fn publish(&self, events: Vec<MarketEvent>) {
        for event in events {
            self.publisher.publish(event).await;
        }
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Privileged follow-up to a committed selection.
    fn update_reputation(
        &self,
        researcher: Address,
        accuracy_bps: u32,
    ) -> MarketResult<(Option<ReputationChange>, Vec<MarketEvent>)> {
        self.transact("update_agent_reputation", |state| {
            if state.directory.agent_of(&researcher).is_none() {
                debug!(
                    researcher = %short_address(&researcher),
                    "No agent registered, reputation update skipped"
                );
                return Ok((None, Vec::new()));
            }
            let reward = state.reports.policy().selection_reward;
            let delta = i64::try_from(reward).unwrap_or(i64::MAX);
            let change = state.directory.update_agent_reputation(
                &self.capability,
                researcher,
                delta,
                accuracy_bps,
            )?;

            let mut events = vec![MarketEvent::ReputationUpdated {
                agent_id: change.agent_id,
                old_score: change.old_score,
                new_score: change.new_score,
            }];
            if change.newly_verified {
                events.push(MarketEvent::AgentVerified {
                    agent_id: change.agent_id,
                });
            }
            Ok((Some(change), events))
        })
    }

    fn config_updated(parameter: &str, value: impl Into<u128>) -> Vec<MarketEvent> {
        vec![MarketEvent::ConfigUpdated {
            parameter: parameter.to_string(),
            value: value.into(),
        }]
    }
}

#[async_trait]
impl<P: EventPublisher, C: TimeSource> MarketplaceApi for MarketplaceService<P, C> {
    async fn create_request(
        &self,
        ctx: CallContext,
        query: String,
        deadline: Timestamp,
    ) -> MarketResult<RequestId> {
        let now = self.now();
        self.run("create_request", move |state| {
            state.ensure_not_paused()?;
            let event_query = query.clone();
            let id = state.requests.create_request(
                &mut state.custody,
                ctx,
                NewRequest::new(query, deadline),
                now,
            )?;
            Ok((
                id,
                vec![MarketEvent::RequestCreated {
                    request_id: id,
                    requester: ctx.caller,
                    query: event_query,
                    bounty: ctx.attached_value,
                    deadline,
                }],
            ))
        })
        .await
    }

    async fn cancel_request(&self, caller: Address, request_id: RequestId) -> MarketResult<Amount> {
        self.run("cancel_request", |state| {
            let refund = state
                .requests
                .cancel_request(&mut state.custody, caller, request_id)?;
            Ok((refund, vec![MarketEvent::RequestCancelled { request_id }]))
        })
        .await
    }

    async fn submit_report(&self, ctx: CallContext, report: NewReport) -> MarketResult<ReportId> {
        let now = self.now();
        self.run("submit_report", move |state| {
            state.ensure_not_paused()?;
            let request_id = report.request_id;
            let artifact_ref = report.artifact_ref.clone();
            let id = state.reports.submit_report(
                &mut state.requests,
                &mut state.custody,
                ctx,
                report,
                now,
            )?;
            Ok((
                id,
                vec![MarketEvent::ReportSubmitted {
                    report_id: id,
                    request_id,
                    researcher: ctx.caller,
                    artifact_ref,
                }],
            ))
        })
        .await
    }

    async fn select_report(
        &self,
        caller: Address,
        request_id: RequestId,
        report_id: ReportId,
        accuracy_bps: u32,
    ) -> MarketResult<SelectionOutcome> {
        let selection = self
            .run("select_report", |state| {
                let selection = state.reports.select_report(
                    &mut state.requests,
                    &mut state.custody,
                    caller,
                    request_id,
                    report_id,
                )?;
                Ok((
                    selection,
                    vec![MarketEvent::ReportSelected {
                        request_id,
                        report_id,
                        researcher: selection.researcher,
                        reward: selection.reward,
                    }],
                ))
            })
            .await?;

        // The selection is committed; a failed follow-up cannot undo it.
        let reputation = match self.update_reputation(selection.researcher, accuracy_bps) {
            Ok((change, events)) => {
                self.publish(events).await;
                change
            }
            Err(e) => {
                error!(
                    request = %request_id,
                    researcher = %short_address(&selection.researcher),
                    error = %e,
                    "Reputation update after selection failed"
                );
                None
            }
        };

        Ok(SelectionOutcome {
            selection,
            reputation,
        })
    }

    async fn return_stake(&self, caller: Address, report_id: ReportId) -> MarketResult<Amount> {
        self.run("return_stake", |state| {
            let amount = state
                .reports
                .return_stake(&state.requests, &mut state.custody, caller, report_id)?;
            Ok((
                amount,
                vec![MarketEvent::StakeReturned {
                    report_id,
                    researcher: caller,
                    amount,
                }],
            ))
        })
        .await
    }

    async fn raise_dispute(&self, ctx: CallContext, report_id: ReportId) -> MarketResult<RequestId> {
        self.run("raise_dispute", |state| {
            if ctx.attached_value != 0 {
                return Err(MarketError::DisputeCarriesValue {
                    attached: ctx.attached_value,
                });
            }
            let request_id = state
                .reports
                .raise_dispute(&mut state.requests, ctx.caller, report_id)?;
            Ok((
                request_id,
                vec![MarketEvent::DisputeRaised {
                    report_id,
                    disputer: ctx.caller,
                }],
            ))
        })
        .await
    }

    async fn register_agent(
        &self,
        ctx: CallContext,
        name: String,
        specialization: String,
    ) -> MarketResult<AgentId> {
        let now = self.now();
        self.run("register_agent", move |state| {
            let id = state.directory.register_agent(
                &mut state.custody,
                ctx,
                &name,
                &specialization,
                now,
            )?;
            Ok((
                id,
                vec![MarketEvent::AgentRegistered {
                    agent_id: id,
                    owner: ctx.caller,
                    name,
                    specialization,
                    stake: ctx.attached_value,
                }],
            ))
        })
        .await
    }

    async fn increase_stake(&self, ctx: CallContext, agent_id: AgentId) -> MarketResult<Amount> {
        self.run("increase_stake", |state| {
            let staked = state
                .directory
                .increase_stake(&mut state.custody, ctx, agent_id)?;
            Ok((
                staked,
                vec![MarketEvent::AgentStakeIncreased {
                    agent_id,
                    amount: ctx.attached_value,
                    staked,
                }],
            ))
        })
        .await
    }

    async fn withdraw_stake(
        &self,
        caller: Address,
        agent_id: AgentId,
        amount: Amount,
    ) -> MarketResult<Amount> {
        self.run("withdraw_stake", |state| {
            let remaining = state
                .directory
                .withdraw_stake(&mut state.custody, caller, agent_id, amount)?;
            Ok((
                remaining,
                vec![MarketEvent::AgentStakeWithdrawn {
                    agent_id,
                    amount,
                    remaining,
                }],
            ))
        })
        .await
    }

    async fn deactivate_agent(&self, caller: Address, agent_id: AgentId) -> MarketResult<()> {
        self.run("deactivate_agent", |state| {
            state.directory.deactivate_agent(caller, agent_id)?;
            Ok(((), vec![MarketEvent::AgentDeactivated { agent_id }]))
        })
        .await
    }

    async fn reactivate_agent(&self, caller: Address, agent_id: AgentId) -> MarketResult<()> {
        self.run("reactivate_agent", |state| {
            state.directory.reactivate_agent(caller, agent_id)?;
            Ok(((), vec![MarketEvent::AgentReactivated { agent_id }]))
        })
        .await
    }
}

#[async_trait]
impl<P: EventPublisher, C: TimeSource> MarketAdminApi for MarketplaceService<P, C> {
    async fn pause(&self, caller: Address) -> MarketResult<()> {
        self.run("pause", |state| {
            state.ensure_admin(caller)?;
            if state.paused {
                return Err(MarketError::PauseUnchanged { paused: true });
            }
            state.paused = true;
            info!("Marketplace paused");
            Ok(((), vec![MarketEvent::Paused { by: caller }]))
        })
        .await
    }

    async fn unpause(&self, caller: Address) -> MarketResult<()> {
        self.run("unpause", |state| {
            state.ensure_admin(caller)?;
            if !state.paused {
                return Err(MarketError::PauseUnchanged { paused: false });
            }
            state.paused = false;
            info!("Marketplace unpaused");
            Ok(((), vec![MarketEvent::Unpaused { by: caller }]))
        })
        .await
    }

    async fn set_fee_percent(&self, caller: Address, fee_percent: u8) -> MarketResult<()> {
        self.run("set_fee_percent", |state| {
            state.ensure_admin(caller)?;
            state.reports.policy_mut().set_fee_percent(fee_percent)?;
            info!(fee_percent, "Fee percent updated");
            Ok(((), Self::config_updated("fee_percent", fee_percent)))
        })
        .await
    }

    async fn set_min_bounty(&self, caller: Address, min_bounty: Amount) -> MarketResult<()> {
        self.run("set_min_bounty", |state| {
            state.ensure_admin(caller)?;
            state.requests.set_min_bounty(min_bounty);
            info!(min_bounty, "Minimum bounty updated");
            Ok(((), Self::config_updated("min_bounty", min_bounty)))
        })
        .await
    }

    async fn set_min_stake(&self, caller: Address, min_stake: Amount) -> MarketResult<()> {
        self.run("set_min_stake", |state| {
            state.ensure_admin(caller)?;
            state.reports.policy_mut().min_stake = min_stake;
            info!(min_stake, "Minimum report stake updated");
            Ok(((), Self::config_updated("min_stake", min_stake)))
        })
        .await
    }

    async fn set_min_agent_stake(
        &self,
        caller: Address,
        min_agent_stake: Amount,
    ) -> MarketResult<()> {
        self.run("set_min_agent_stake", |state| {
            state.ensure_admin(caller)?;
            state.directory.policy_mut().min_agent_stake = min_agent_stake;
            info!(min_agent_stake, "Minimum agent stake updated");
            Ok(((), Self::config_updated("min_agent_stake", min_agent_stake)))
        })
        .await
    }

    async fn set_verification_threshold(&self, caller: Address, threshold: u64) -> MarketResult<()> {
        self.run("set_verification_threshold", |state| {
            state.ensure_admin(caller)?;
            state.directory.policy_mut().verification_threshold = threshold;
            info!(threshold, "Verification threshold updated");
            Ok(((), Self::config_updated("verification_threshold", threshold)))
        })
        .await
    }

    async fn slash_report_stake(
        &self,
        caller: Address,
        report_id: ReportId,
    ) -> MarketResult<StakeSlash> {
        self.run("slash_report_stake", |state| {
            state.ensure_admin(caller)?;
            let slash = state.reports.slash_stake(&mut state.custody, report_id)?;
            Ok((
                slash,
                vec![MarketEvent::StakeSlashed {
                    researcher: slash.researcher,
                    amount: slash.amount,
                }],
            ))
        })
        .await
    }

    async fn slash_agent_stake(
        &self,
        caller: Address,
        agent_id: AgentId,
        amount: Amount,
    ) -> MarketResult<AgentSlash> {
        self.run("slash_agent_stake", |state| {
            state.ensure_admin(caller)?;
            let sink = state.admin;
            let slash = state
                .directory
                .slash_stake(&mut state.custody, agent_id, amount, sink)?;
            Ok((
                slash,
                vec![MarketEvent::AgentSlashed {
                    agent_id,
                    amount: slash.amount,
                    reputation: slash.reputation,
                }],
            ))
        })
        .await
    }

    async fn withdraw_fees(&self, caller: Address, to: Address) -> MarketResult<Amount> {
        self.run("withdraw_fees", |state| {
            state.ensure_admin(caller)?;
            if to == ZERO_ADDRESS {
                return Err(MarketError::ZeroRecipient);
            }
            let amount = state.reports.withdraw_fees(&mut state.custody, to)?;
            let events = if amount == 0 {
                Vec::new()
            } else {
                vec![MarketEvent::FeesWithdrawn { to, amount }]
            };
            Ok((amount, events))
        })
        .await
    }
}
