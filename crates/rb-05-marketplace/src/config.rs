//! Marketplace configuration.

use crate::error::{MarketError, MarketResult};
use rb_04_report_ledger::MAX_FEE_PERCENT_CEILING;
use serde::{Deserialize, Serialize};
use shared_types::{units, Address, Amount, ZERO_ADDRESS};
use std::env;
use std::str::FromStr;
use tracing::warn;

/// Tunables of every component, plus the administrator identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Identity allowed to call the administrative surface. Also the fee sink
    /// for agent slashes.
    pub admin: Address,
    pub min_bounty: Amount,
    pub min_stake: Amount,
    pub fee_percent: u8,
    /// Upper bound for `fee_percent`, itself bounded by the hard ceiling.
    pub max_fee_percent: u8,
    pub min_agent_stake: Amount,
    pub verification_threshold: u64,
    /// Reputation granted on selection, both to the researcher's counter and
    /// to their agent.
    pub selection_reputation_reward: u64,
    pub report_slash_penalty: u64,
    pub agent_slash_penalty: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            admin: ZERO_ADDRESS,
            min_bounty: units(1, 100),
            min_stake: units(5, 1000),
            fee_percent: 5,
            max_fee_percent: MAX_FEE_PERCENT_CEILING,
            min_agent_stake: units(1, 10),
            verification_threshold: 100,
            selection_reputation_reward: 10,
            report_slash_penalty: 20,
            agent_slash_penalty: 50,
        }
    }
}

impl MarketConfig {
    /// Default configuration administered by `admin`.
    pub fn with_admin(admin: Address) -> Self {
        Self {
            admin,
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RB_ADMIN`: administrator address, 40 hex digits with optional `0x`
    /// - `RB_MIN_BOUNTY`, `RB_MIN_STAKE`, `RB_MIN_AGENT_STAKE`: smallest units
    /// - `RB_FEE_PERCENT`, `RB_MAX_FEE_PERCENT`: whole percent
    /// - `RB_VERIFICATION_THRESHOLD`
    /// - `RB_SELECTION_REPUTATION_REWARD`
    /// - `RB_REPORT_SLASH_PENALTY`, `RB_AGENT_SLASH_PENALTY`
    ///
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            admin: env::var("RB_ADMIN")
                .ok()
                .and_then(|raw| {
                    let parsed = parse_address(&raw);
                    if parsed.is_none() {
                        warn!(key = "RB_ADMIN", value = %raw, "Unparseable value, using default");
                    }
                    parsed
                })
                .unwrap_or(defaults.admin),
            min_bounty: env_or("RB_MIN_BOUNTY", defaults.min_bounty),
            min_stake: env_or("RB_MIN_STAKE", defaults.min_stake),
            fee_percent: env_or("RB_FEE_PERCENT", defaults.fee_percent),
            max_fee_percent: env_or("RB_MAX_FEE_PERCENT", defaults.max_fee_percent),
            min_agent_stake: env_or("RB_MIN_AGENT_STAKE", defaults.min_agent_stake),
            verification_threshold: env_or(
                "RB_VERIFICATION_THRESHOLD",
                defaults.verification_threshold,
            ),
            selection_reputation_reward: env_or(
                "RB_SELECTION_REPUTATION_REWARD",
                defaults.selection_reputation_reward,
            ),
            report_slash_penalty: env_or("RB_REPORT_SLASH_PENALTY", defaults.report_slash_penalty),
            agent_slash_penalty: env_or("RB_AGENT_SLASH_PENALTY", defaults.agent_slash_penalty),
        }
    }

    pub fn validate(&self) -> MarketResult<()> {
        if self.max_fee_percent > MAX_FEE_PERCENT_CEILING {
            return Err(MarketError::InvalidConfig(format!(
                "max_fee_percent {} exceeds ceiling {}",
                self.max_fee_percent, MAX_FEE_PERCENT_CEILING
            )));
        }
        if self.fee_percent > self.max_fee_percent {
            return Err(MarketError::InvalidConfig(format!(
                "fee_percent {} exceeds max_fee_percent {}",
                self.fee_percent, self.max_fee_percent
            )));
        }
        if self.admin == ZERO_ADDRESS {
            return Err(MarketError::InvalidConfig(
                "administrator must not be the zero address".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Unparseable value, using default");
            default
        }),
        Err(_) => default,
    }
}

fn parse_address(raw: &str) -> Option<Address> {
    let raw = raw.trim();
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits)
        .ok()
        .and_then(|bytes| Address::try_from(bytes.as_slice()).ok())
}
