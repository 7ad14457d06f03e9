//! Fee split and report policy.

use crate::error::{ReportError, ReportResult};
use serde::{Deserialize, Serialize};
use shared_types::Amount;

/// Hard ceiling on the platform fee, in percent.
pub const MAX_FEE_PERCENT_CEILING: u8 = 10;

/// Division of a bounty between the platform and the selected researcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub fee: Amount,
    pub reward: Amount,
}

impl FeeSplit {
    /// `fee = bounty * fee_percent / 100` truncating, `reward = bounty - fee`.
    pub fn compute(bounty: Amount, fee_percent: u8) -> ReportResult<Self> {
        let fee = bounty
            .checked_mul(Amount::from(fee_percent))
            .ok_or(ReportError::ArithmeticOverflow)?
            / 100;
        let reward = bounty.checked_sub(fee).ok_or(ReportError::ArithmeticOverflow)?;
        Ok(Self { fee, reward })
    }
}

/// Tunables of the report ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPolicy {
    pub min_stake: Amount,
    fee_percent: u8,
    max_fee_percent: u8,
    /// Added to the researcher's reputation counter on selection.
    pub selection_reward: u64,
    /// Removed from the researcher's reputation counter on slash.
    pub slash_penalty: u64,
}

impl ReportPolicy {
    pub fn new(
        min_stake: Amount,
        fee_percent: u8,
        max_fee_percent: u8,
        selection_reward: u64,
        slash_penalty: u64,
    ) -> ReportResult<Self> {
        if max_fee_percent > MAX_FEE_PERCENT_CEILING {
            return Err(ReportError::FeeAboveCeiling {
                fee_percent: max_fee_percent,
                ceiling: MAX_FEE_PERCENT_CEILING,
            });
        }
        let mut policy = Self {
            min_stake,
            fee_percent: 0,
            max_fee_percent,
            selection_reward,
            slash_penalty,
        };
        policy.set_fee_percent(fee_percent)?;
        Ok(policy)
    }

    pub fn fee_percent(&self) -> u8 {
        self.fee_percent
    }

    pub fn max_fee_percent(&self) -> u8 {
        self.max_fee_percent
    }

    /// Bounded here, never at use time.
    pub fn set_fee_percent(&mut self, fee_percent: u8) -> ReportResult<()> {
        if fee_percent > self.max_fee_percent {
            return Err(ReportError::FeeAboveCeiling {
                fee_percent,
                ceiling: self.max_fee_percent,
            });
        }
        self.fee_percent = fee_percent;
        Ok(())
    }
}
