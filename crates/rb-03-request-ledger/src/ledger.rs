//! Request Ledger - request table and bounty escrow.

use crate::domain::{Request, RequestStatus};
use crate::error::{RequestError, RequestResult};
use rb_01_value_custody::{CustodyBucket, ValueCustody};
use shared_types::{short_address, Address, Amount, CallContext, ReportId, RequestId, Timestamp};
use std::collections::BTreeMap;
use tracing::info;

/// Parameters of a new request. The bounty is the value attached to the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub query: String,
    pub deadline: Timestamp,
}

impl NewRequest {
    pub fn new(query: impl Into<String>, deadline: Timestamp) -> Self {
        Self {
            query: query.into(),
            deadline,
        }
    }
}

/// Owns every request, keyed by sequential identifier.
#[derive(Debug, Clone)]
pub struct RequestLedger {
    requests: BTreeMap<RequestId, Request>,
    next_id: RequestId,
    min_bounty: Amount,
}

impl RequestLedger {
    pub fn new(min_bounty: Amount) -> Self {
        Self {
            requests: BTreeMap::new(),
            next_id: RequestId::FIRST,
            min_bounty,
        }
    }

    pub fn min_bounty(&self) -> Amount {
        self.min_bounty
    }

    pub fn set_min_bounty(&mut self, min_bounty: Amount) {
        self.min_bounty = min_bounty;
    }

    /// Open a request and escrow the attached bounty.
    pub fn create_request(
        &mut self,
        custody: &mut ValueCustody,
        ctx: CallContext,
        new: NewRequest,
        now: Timestamp,
    ) -> RequestResult<RequestId> {
        let bounty = ctx.attached_value;
        if bounty < self.min_bounty {
            return Err(RequestError::BountyTooLow {
                bounty,
                minimum: self.min_bounty,
            });
        }
        if new.deadline <= now {
            return Err(RequestError::DeadlineNotInFuture {
                deadline: new.deadline,
                now,
            });
        }
        if new.query.trim().is_empty() {
            return Err(RequestError::EmptyQuery);
        }

        let id = self.next_id;
        self.next_id = id.next();
        self.requests.insert(
            id,
            Request {
                id,
                requester: ctx.caller,
                query: new.query,
                bounty,
                deadline: new.deadline,
                status: RequestStatus::Pending,
                submitted_reports: Vec::new(),
                selected_report: None,
                created_at: now,
            },
        );

        custody.hold(ctx.caller, CustodyBucket::Bounty(id), bounty)?;

        info!(
            request = %id,
            requester = %short_address(&ctx.caller),
            bounty,
            deadline = new.deadline,
            "Request created"
        );
        Ok(id)
    }

    /// Cancel a report-less pending request and refund the bounty.
    pub fn cancel_request(
        &mut self,
        custody: &mut ValueCustody,
        caller: Address,
        id: RequestId,
    ) -> RequestResult<Amount> {
        let request = self.get_mut(id)?;
        if !request.is_requester(&caller) {
            return Err(RequestError::NotRequester {
                request: id,
                caller,
            });
        }
        if !request.submitted_reports.is_empty() {
            return Err(RequestError::HasReports {
                request: id,
                count: request.submitted_reports.len(),
            });
        }
        Self::transition(request, RequestStatus::Cancelled)?;
        let refund = request.bounty;
        let requester = request.requester;

        custody.release(CustodyBucket::Bounty(id), requester, refund)?;

        info!(request = %id, refund, "Request cancelled");
        Ok(refund)
    }

    /// Append a report and advance Pending → InProgress on the first one.
    pub fn record_submission(&mut self, id: RequestId, report: ReportId) -> RequestResult<()> {
        let request = self.get_mut(id)?;
        if !request.status.accepts_reports() {
            return Err(RequestError::InvalidTransition {
                request: id,
                from: request.status,
                to: RequestStatus::InProgress,
            });
        }
        request.submitted_reports.push(report);
        if request.status == RequestStatus::Pending {
            Self::transition(request, RequestStatus::InProgress)?;
        }
        Ok(())
    }

    /// InProgress → Completed, recording the winning report.
    pub fn complete(&mut self, id: RequestId, report: ReportId) -> RequestResult<()> {
        let request = self.get_mut(id)?;
        if request.status != RequestStatus::InProgress || request.selected_report.is_some() {
            return Err(RequestError::InvalidTransition {
                request: id,
                from: request.status,
                to: RequestStatus::Completed,
            });
        }
        Self::transition(request, RequestStatus::Completed)?;
        request.selected_report = Some(report);
        Ok(())
    }

    pub fn mark_disputed(&mut self, id: RequestId) -> RequestResult<()> {
        let request = self.get_mut(id)?;
        Self::transition(request, RequestStatus::Disputed)
    }

    pub fn request(&self, id: RequestId) -> Option<&Request> {
        self.requests.get(&id)
    }

    pub fn get(&self, id: RequestId) -> RequestResult<&Request> {
        self.requests.get(&id).ok_or(RequestError::NotFound(id))
    }

    pub fn requests(&self) -> impl Iterator<Item = &Request> {
        self.requests.values()
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Sum of bounties still in custody.
    pub fn held_bounties(&self) -> Amount {
        self.requests
            .values()
            .filter(|r| r.status.holds_bounty())
            .fold(0, |acc, r| acc.saturating_add(r.bounty))
    }

    fn get_mut(&mut self, id: RequestId) -> RequestResult<&mut Request> {
        self.requests.get_mut(&id).ok_or(RequestError::NotFound(id))
    }

    fn transition(request: &mut Request, to: RequestStatus) -> RequestResult<()> {
        if !request.status.can_transition_to(to) {
            return Err(RequestError::InvalidTransition {
                request: request.id,
                from: request.status,
                to,
            });
        }
        request.status = to;
        Ok(())
    }
}
