//! The whole market state, cloned per operation.

use crate::config::MarketConfig;
use crate::error::{MarketError, MarketResult};
use rb_01_value_custody::{CustodyBucket, ValueCustody, ValueTransferGateway};
use rb_02_agent_directory::{AgentDirectory, DirectoryPolicy};
use rb_03_request_ledger::RequestLedger;
use rb_04_report_ledger::{ReportLedger, ReportPolicy};
use shared_types::{short_address, Address, Amount};
use std::sync::Arc;
use tracing::warn;

/// Every component plus the administrative flags.
///
/// Components reference each other only through the arguments their
/// operations take, so one clone of this struct is a complete, independent
/// copy of the market.
#[derive(Debug, Clone)]
pub struct MarketState {
    pub(crate) custody: ValueCustody,
    pub(crate) directory: AgentDirectory,
    pub(crate) requests: RequestLedger,
    pub(crate) reports: ReportLedger,
    pub(crate) admin: Address,
    pub(crate) paused: bool,
}

impl MarketState {
    pub fn new(config: &MarketConfig, gateway: Arc<dyn ValueTransferGateway>) -> MarketResult<Self> {
        config.validate()?;
        let report_policy = ReportPolicy::new(
            config.min_stake,
            config.fee_percent,
            config.max_fee_percent,
            config.selection_reputation_reward,
            config.report_slash_penalty,
        )?;
        Ok(Self {
            custody: ValueCustody::new(gateway),
            directory: AgentDirectory::new(DirectoryPolicy {
                min_agent_stake: config.min_agent_stake,
                verification_threshold: config.verification_threshold,
                slash_penalty: config.agent_slash_penalty,
            }),
            requests: RequestLedger::new(config.min_bounty),
            reports: ReportLedger::new(report_policy),
            admin: config.admin,
            paused: false,
        })
    }

    pub fn custody(&self) -> &ValueCustody {
        &self.custody
    }

    pub fn directory(&self) -> &AgentDirectory {
        &self.directory
    }

    pub fn requests(&self) -> &RequestLedger {
        &self.requests
    }

    pub fn reports(&self) -> &ReportLedger {
        &self.reports
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn accumulated_fees(&self) -> Amount {
        self.reports.accumulated_fees(&self.custody)
    }

    /// Custody total equals what the ledgers say they hold.
    pub fn is_consistent(&self) -> bool {
        let owed = [
            self.requests.held_bounties(),
            self.reports.held_stakes(),
            self.directory.held_stakes(),
            self.custody.balance_of(CustodyBucket::PlatformFees),
        ]
        .into_iter()
        .try_fold(0u128, |acc, v| acc.checked_add(v));
        self.custody.is_balanced() && owed == Some(self.custody.total_held())
    }

    pub(crate) fn ensure_admin(&self, caller: Address) -> MarketResult<()> {
        if caller != self.admin {
            warn!(caller = %short_address(&caller), "Rejected administrative call");
            return Err(MarketError::Unauthorized { caller });
        }
        Ok(())
    }

    pub(crate) fn ensure_not_paused(&self) -> MarketResult<()> {
        if self.paused {
            return Err(MarketError::Paused);
        }
        Ok(())
    }
}
