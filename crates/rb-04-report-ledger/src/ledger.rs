//! Report Ledger - report table, stake custody and settlement.

use crate::domain::{FeeSplit, Report, ReportPolicy, ReportStatus};
use crate::error::{ReportError, ReportResult};
use rb_01_value_custody::{CustodyBucket, ValueCustody};
use rb_03_request_ledger::{RequestLedger, RequestStatus};
use shared_types::{
    short_address, Address, Amount, CallContext, Hash, ReportId, RequestId, Timestamp,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// Parameters of a new report. The stake is the value attached to the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub request_id: RequestId,
    pub artifact_ref: String,
    pub commitment: Hash,
}

impl NewReport {
    pub fn new(request_id: RequestId, artifact_ref: impl Into<String>, commitment: Hash) -> Self {
        Self {
            request_id,
            artifact_ref: artifact_ref.into(),
            commitment,
        }
    }
}

/// Outcome of a winner selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub request_id: RequestId,
    pub report_id: ReportId,
    pub researcher: Address,
    pub reward: Amount,
    pub fee: Amount,
    pub stake_returned: Amount,
}

impl Selection {
    /// Total delivered to the researcher.
    pub fn payout(&self) -> Amount {
        self.reward.saturating_add(self.stake_returned)
    }
}

/// Outcome of slashing a disputed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeSlash {
    pub report_id: ReportId,
    pub researcher: Address,
    pub amount: Amount,
    pub reputation: u64,
}

/// Owns every report and the per-researcher reputation counter.
#[derive(Debug, Clone)]
pub struct ReportLedger {
    reports: BTreeMap<ReportId, Report>,
    next_id: ReportId,
    /// (request, researcher) pairs that have submitted. Never shrinks.
    submissions: HashSet<(RequestId, Address)>,
    researcher_reputation: HashMap<Address, u64>,
    policy: ReportPolicy,
}

impl ReportLedger {
    pub fn new(policy: ReportPolicy) -> Self {
        Self {
            reports: BTreeMap::new(),
            next_id: ReportId::FIRST,
            submissions: HashSet::new(),
            researcher_reputation: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &ReportPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut ReportPolicy {
        &mut self.policy
    }

    /// Submit a staked report against an open request.
    pub fn submit_report(
        &mut self,
        requests: &mut RequestLedger,
        custody: &mut ValueCustody,
        ctx: CallContext,
        new: NewReport,
        now: Timestamp,
    ) -> ReportResult<ReportId> {
        let request = requests.get(new.request_id)?;
        if !request.status.accepts_reports() {
            return Err(ReportError::RequestStatusMismatch {
                request: request.id,
                status: request.status,
            });
        }
        if request.deadline_passed(now) {
            return Err(ReportError::DeadlinePassed {
                request: request.id,
                deadline: request.deadline,
                now,
            });
        }
        let stake = ctx.attached_value;
        if stake < self.policy.min_stake {
            return Err(ReportError::StakeTooLow {
                stake,
                minimum: self.policy.min_stake,
            });
        }
        if self.has_submitted(new.request_id, &ctx.caller) {
            return Err(ReportError::AlreadySubmitted {
                request: new.request_id,
                researcher: ctx.caller,
            });
        }
        if new.artifact_ref.trim().is_empty() {
            return Err(ReportError::EmptyArtifact);
        }

        let id = self.next_id;
        self.next_id = id.next();
        self.reports.insert(
            id,
            Report {
                id,
                researcher: ctx.caller,
                request_id: new.request_id,
                artifact_ref: new.artifact_ref,
                commitment: new.commitment,
                stake,
                status: ReportStatus::Submitted,
                created_at: now,
            },
        );
        self.submissions.insert((new.request_id, ctx.caller));
        requests.record_submission(new.request_id, id)?;

        custody.hold(ctx.caller, CustodyBucket::ReportStake(id), stake)?;

        info!(
            report = %id,
            request = %new.request_id,
            researcher = %short_address(&ctx.caller),
            stake,
            "Report submitted"
        );
        Ok(id)
    }

    /// Select the winning report, split the bounty and pay the researcher.
    pub fn select_report(
        &mut self,
        requests: &mut RequestLedger,
        custody: &mut ValueCustody,
        caller: Address,
        request_id: RequestId,
        report_id: ReportId,
    ) -> ReportResult<Selection> {
        let request = requests.get(request_id)?;
        if !request.is_requester(&caller) {
            return Err(ReportError::NotRequester {
                request: request_id,
                caller,
            });
        }
        if request.status != RequestStatus::InProgress {
            return Err(ReportError::RequestStatusMismatch {
                request: request_id,
                status: request.status,
            });
        }
        let bounty = request.bounty;
        let split = FeeSplit::compute(bounty, self.policy.fee_percent())?;

        let report = self.get_mut(report_id)?;
        if report.request_id != request_id {
            return Err(ReportError::ReportMismatch {
                report: report_id,
                request: request_id,
            });
        }
        Self::transition(report, ReportStatus::Selected)?;
        let researcher = report.researcher;
        let stake = report.take_stake().unwrap_or(0);

        requests.complete(request_id, report_id)?;
        let reputation = self.reward_researcher(researcher);

        custody.reassign(
            CustodyBucket::Bounty(request_id),
            CustodyBucket::PlatformFees,
            split.fee,
        )?;
        custody.release_combined(
            &[
                (CustodyBucket::Bounty(request_id), split.reward),
                (CustodyBucket::ReportStake(report_id), stake),
            ],
            researcher,
        )?;

        info!(
            request = %request_id,
            report = %report_id,
            researcher = %short_address(&researcher),
            reward = split.reward,
            fee = split.fee,
            stake,
            reputation,
            "Report selected"
        );
        Ok(Selection {
            request_id,
            report_id,
            researcher,
            reward: split.reward,
            fee: split.fee,
            stake_returned: stake,
        })
    }

    /// Return the stake of a report that was not chosen.
    pub fn return_stake(
        &mut self,
        requests: &RequestLedger,
        custody: &mut ValueCustody,
        caller: Address,
        report_id: ReportId,
    ) -> ReportResult<Amount> {
        let report = self.get(report_id)?;
        if report.researcher != caller {
            return Err(ReportError::NotResearcher {
                report: report_id,
                caller,
            });
        }
        let request = requests.get(report.request_id)?;
        if request.status != RequestStatus::Completed {
            return Err(ReportError::RequestStatusMismatch {
                request: request.id,
                status: request.status,
            });
        }
        if report.status != ReportStatus::Submitted {
            return Err(ReportError::StakeAlreadySettled(report_id));
        }

        let report = self.get_mut(report_id)?;
        let stake = report
            .take_stake()
            .ok_or(ReportError::StakeAlreadySettled(report_id))?;

        custody.release(CustodyBucket::ReportStake(report_id), caller, stake)?;

        info!(report = %report_id, researcher = %short_address(&caller), stake, "Stake returned");
        Ok(stake)
    }

    /// Flag the selected report and its request as disputed.
    pub fn raise_dispute(
        &mut self,
        requests: &mut RequestLedger,
        caller: Address,
        report_id: ReportId,
    ) -> ReportResult<RequestId> {
        let request_id = self.get(report_id)?.request_id;
        let request = requests.get(request_id)?;
        if !request.is_requester(&caller) && !self.has_submitted(request_id, &caller) {
            return Err(ReportError::NotParticipant {
                request: request_id,
                caller,
            });
        }

        let report = self.get_mut(report_id)?;
        Self::transition(report, ReportStatus::Disputed)?;
        requests.mark_disputed(request_id)?;

        info!(
            report = %report_id,
            request = %request_id,
            disputer = %short_address(&caller),
            "Dispute raised"
        );
        Ok(request_id)
    }

    /// Forfeit a disputed report's stake to the platform and penalise the researcher.
    ///
    /// Callers are responsible for the administrator check.
    pub fn slash_stake(
        &mut self,
        custody: &mut ValueCustody,
        report_id: ReportId,
    ) -> ReportResult<StakeSlash> {
        let report = self.get_mut(report_id)?;
        Self::transition(report, ReportStatus::Rejected)?;
        let researcher = report.researcher;
        let amount = report.take_stake().unwrap_or(0);

        let penalty = self.policy.slash_penalty;
        let reputation = self.researcher_reputation.entry(researcher).or_insert(0);
        *reputation = reputation.saturating_sub(penalty);
        let reputation = *reputation;

        custody.reassign(
            CustodyBucket::ReportStake(report_id),
            CustodyBucket::PlatformFees,
            amount,
        )?;

        info!(
            report = %report_id,
            researcher = %short_address(&researcher),
            amount,
            reputation,
            "Stake slashed"
        );
        Ok(StakeSlash {
            report_id,
            researcher,
            amount,
            reputation,
        })
    }

    /// Deliver the whole platform-fee balance to `to`.
    pub fn withdraw_fees(&mut self, custody: &mut ValueCustody, to: Address) -> ReportResult<Amount> {
        let amount = custody.balance_of(CustodyBucket::PlatformFees);
        custody.release(CustodyBucket::PlatformFees, to, amount)?;
        if amount == 0 {
            debug!("No fees to withdraw");
        } else {
            info!(to = %short_address(&to), amount, "Fees withdrawn");
        }
        Ok(amount)
    }

    pub fn report(&self, id: ReportId) -> Option<&Report> {
        self.reports.get(&id)
    }

    pub fn get(&self, id: ReportId) -> ReportResult<&Report> {
        self.reports.get(&id).ok_or(ReportError::NotFound(id))
    }

    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.reports.values()
    }

    /// Reports for `request_id` in submission order.
    pub fn reports_for(&self, request_id: RequestId) -> Vec<&Report> {
        self.reports
            .values()
            .filter(|r| r.request_id == request_id)
            .collect()
    }

    pub fn has_submitted(&self, request_id: RequestId, researcher: &Address) -> bool {
        self.submissions.contains(&(request_id, *researcher))
    }

    pub fn researcher_reputation(&self, researcher: &Address) -> u64 {
        self.researcher_reputation.get(researcher).copied().unwrap_or(0)
    }

    pub fn accumulated_fees(&self, custody: &ValueCustody) -> Amount {
        custody.balance_of(CustodyBucket::PlatformFees)
    }

    /// Sum of stakes still in custody.
    pub fn held_stakes(&self) -> Amount {
        self.reports
            .values()
            .fold(0, |acc, r| acc.saturating_add(r.stake))
    }

    fn reward_researcher(&mut self, researcher: Address) -> u64 {
        let reward = self.policy.selection_reward;
        let reputation = self.researcher_reputation.entry(researcher).or_insert(0);
        *reputation = reputation.saturating_add(reward);
        *reputation
    }

    fn get_mut(&mut self, id: ReportId) -> ReportResult<&mut Report> {
        self.reports.get_mut(&id).ok_or(ReportError::NotFound(id))
    }

    fn transition(report: &mut Report, to: ReportStatus) -> ReportResult<()> {
        if !report.status.can_transition_to(to) {
            return Err(ReportError::InvalidTransition {
                report: report.id,
                from: report.status,
                to,
            });
        }
        report.status = to;
        Ok(())
    }
}
