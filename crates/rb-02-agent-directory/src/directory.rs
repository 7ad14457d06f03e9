//! Agent Directory - agent table, stake custody and reputation.

use crate::domain::{Agent, ReputationCapability, INITIAL_ACCURACY_BPS, MAX_ACCURACY_BPS};
use crate::error::{DirectoryError, DirectoryResult};
use rb_01_value_custody::{CustodyBucket, ValueCustody};
use shared_types::{short_address, Address, AgentId, Amount, CallContext, Timestamp};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};
use uuid::Uuid;

/// Directory tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPolicy {
    pub min_agent_stake: Amount,
    pub verification_threshold: u64,
    /// Reputation removed by an administrative slash.
    pub slash_penalty: u64,
}

/// Outcome of a reputation update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReputationChange {
    pub agent_id: AgentId,
    pub old_score: u64,
    pub new_score: u64,
    pub accuracy_bps: u32,
    pub newly_verified: bool,
}

/// Outcome of an administrative slash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSlash {
    pub agent_id: AgentId,
    pub amount: Amount,
    pub remaining_stake: Amount,
    pub reputation: u64,
}

/// Owns every agent record.
#[derive(Debug, Clone)]
pub struct AgentDirectory {
    agents: BTreeMap<AgentId, Agent>,
    by_owner: HashMap<Address, AgentId>,
    next_id: AgentId,
    policy: DirectoryPolicy,
    /// Token of the one capability allowed to update reputation.
    marketplace: Option<Uuid>,
}

impl AgentDirectory {
    pub fn new(policy: DirectoryPolicy) -> Self {
        Self {
            agents: BTreeMap::new(),
            by_owner: HashMap::new(),
            next_id: AgentId::FIRST,
            policy,
            marketplace: None,
        }
    }

    /// Mint the privileged capability. Succeeds exactly once.
    pub fn bind_marketplace(&mut self) -> DirectoryResult<ReputationCapability> {
        if self.marketplace.is_some() {
            warn!("Rejected second marketplace binding");
            return Err(DirectoryError::CapabilityAlreadyBound);
        }
        let capability = ReputationCapability::mint();
        self.marketplace = Some(capability.token());
        info!("Marketplace capability bound");
        Ok(capability)
    }

    pub fn policy(&self) -> &DirectoryPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut DirectoryPolicy {
        &mut self.policy
    }

    /// Register the caller's agent, staking the attached value.
    pub fn register_agent(
        &mut self,
        custody: &mut ValueCustody,
        ctx: CallContext,
        name: &str,
        specialization: &str,
        now: Timestamp,
    ) -> DirectoryResult<AgentId> {
        if let Some(&agent) = self.by_owner.get(&ctx.caller) {
            return Err(DirectoryError::AlreadyRegistered {
                owner: ctx.caller,
                agent,
            });
        }
        let stake = ctx.attached_value;
        if stake < self.policy.min_agent_stake {
            return Err(DirectoryError::StakeTooLow {
                stake,
                minimum: self.policy.min_agent_stake,
            });
        }
        if name.trim().is_empty() {
            return Err(DirectoryError::EmptyName);
        }

        let id = self.next_id;
        self.next_id = id.next();
        self.agents.insert(
            id,
            Agent {
                id,
                owner: ctx.caller,
                name: name.to_string(),
                specialization: specialization.to_string(),
                reputation: 0,
                completed_tasks: 0,
                accuracy_bps: INITIAL_ACCURACY_BPS,
                is_verified: false,
                staked: stake,
                is_active: true,
                registered_at: now,
            },
        );
        self.by_owner.insert(ctx.caller, id);

        custody.hold(ctx.caller, CustodyBucket::AgentStake(id), stake)?;

        info!(
            agent = %id,
            owner = %short_address(&ctx.caller),
            name,
            specialization,
            stake,
            "Agent registered"
        );
        Ok(id)
    }

    /// Top up stake with the attached value. Returns the new stake.
    pub fn increase_stake(
        &mut self,
        custody: &mut ValueCustody,
        ctx: CallContext,
        agent_id: AgentId,
    ) -> DirectoryResult<Amount> {
        let agent = self.owned_mut(agent_id, &ctx.caller)?;
        if ctx.attached_value == 0 {
            return Err(DirectoryError::ZeroAmount);
        }
        agent.staked = agent
            .staked
            .checked_add(ctx.attached_value)
            .ok_or(DirectoryError::StakeOverflow)?;
        let staked = agent.staked;

        custody.hold(ctx.caller, CustodyBucket::AgentStake(agent_id), ctx.attached_value)?;

        info!(agent = %agent_id, added = ctx.attached_value, staked, "Agent stake increased");
        Ok(staked)
    }

    /// Withdraw stake from an inactive agent. Returns the remaining stake.
    pub fn withdraw_stake(
        &mut self,
        custody: &mut ValueCustody,
        caller: Address,
        agent_id: AgentId,
        amount: Amount,
    ) -> DirectoryResult<Amount> {
        let minimum = self.policy.min_agent_stake;
        let agent = self.owned_mut(agent_id, &caller)?;
        if agent.is_active {
            return Err(DirectoryError::AgentActive(agent_id));
        }
        if amount == 0 {
            return Err(DirectoryError::ZeroAmount);
        }
        let remaining = agent
            .staked
            .checked_sub(amount)
            .ok_or(DirectoryError::ExceedsStake {
                requested: amount,
                staked: agent.staked,
            })?;
        if remaining != 0 && remaining < minimum {
            return Err(DirectoryError::RemainderBelowMinimum { remaining, minimum });
        }
        agent.staked = remaining;

        custody.release(CustodyBucket::AgentStake(agent_id), caller, amount)?;

        info!(agent = %agent_id, amount, remaining, "Agent stake withdrawn");
        Ok(remaining)
    }

    /// Privileged reputation update, issued by the bound marketplace.
    pub fn update_agent_reputation(
        &mut self,
        capability: &ReputationCapability,
        owner: Address,
        delta: i64,
        accuracy_bps: u32,
    ) -> DirectoryResult<ReputationChange> {
        if self.marketplace != Some(capability.token()) {
            warn!(owner = %short_address(&owner), "Reputation update with foreign capability");
            return Err(DirectoryError::UnauthorizedCapability);
        }
        let threshold = self.policy.verification_threshold;
        let agent_id = *self
            .by_owner
            .get(&owner)
            .ok_or(DirectoryError::NoAgentForOwner(owner))?;
        let agent = self.get_mut(agent_id)?;

        let old_score = agent.reputation;
        agent.apply_reputation_delta(delta);
        if delta > 0 {
            agent.completed_tasks = agent.completed_tasks.saturating_add(1);
        }
        if accuracy_bps <= MAX_ACCURACY_BPS {
            agent.accuracy_bps = accuracy_bps;
        }
        let newly_verified = agent.check_verification(threshold);

        info!(
            agent = %agent_id,
            old_score,
            new_score = agent.reputation,
            accuracy_bps = agent.accuracy_bps,
            newly_verified,
            "Reputation updated"
        );
        Ok(ReputationChange {
            agent_id,
            old_score,
            new_score: agent.reputation,
            accuracy_bps: agent.accuracy_bps,
            newly_verified,
        })
    }

    pub fn deactivate_agent(&mut self, caller: Address, agent_id: AgentId) -> DirectoryResult<()> {
        let agent = self.owned_mut(agent_id, &caller)?;
        if !agent.is_active {
            return Err(DirectoryError::ActivationUnchanged {
                agent: agent_id,
                active: false,
            });
        }
        agent.is_active = false;
        info!(agent = %agent_id, "Agent deactivated");
        Ok(())
    }

    pub fn reactivate_agent(&mut self, caller: Address, agent_id: AgentId) -> DirectoryResult<()> {
        let minimum = self.policy.min_agent_stake;
        let agent = self.owned_mut(agent_id, &caller)?;
        if agent.is_active {
            return Err(DirectoryError::ActivationUnchanged {
                agent: agent_id,
                active: true,
            });
        }
        if agent.staked < minimum {
            return Err(DirectoryError::StakeTooLow {
                stake: agent.staked,
                minimum,
            });
        }
        agent.is_active = true;
        info!(agent = %agent_id, "Agent reactivated");
        Ok(())
    }

    /// Administrative slash: burn stake to `sink` and cut reputation.
    pub fn slash_stake(
        &mut self,
        custody: &mut ValueCustody,
        agent_id: AgentId,
        amount: Amount,
        sink: Address,
    ) -> DirectoryResult<AgentSlash> {
        let penalty = self.policy.slash_penalty;
        let agent = self.get_mut(agent_id)?;
        if amount == 0 {
            return Err(DirectoryError::ZeroAmount);
        }
        let remaining = agent
            .staked
            .checked_sub(amount)
            .ok_or(DirectoryError::ExceedsStake {
                requested: amount,
                staked: agent.staked,
            })?;
        agent.staked = remaining;
        agent.reputation = agent.reputation.saturating_sub(penalty);
        let reputation = agent.reputation;

        custody.release(CustodyBucket::AgentStake(agent_id), sink, amount)?;

        warn!(agent = %agent_id, amount, remaining, reputation, "Agent slashed");
        Ok(AgentSlash {
            agent_id,
            amount,
            remaining_stake: remaining,
            reputation,
        })
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn agent_of(&self, owner: &Address) -> Option<&Agent> {
        self.by_owner.get(owner).and_then(|id| self.agents.get(id))
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Sum of agent stakes in custody.
    pub fn held_stakes(&self) -> Amount {
        self.agents
            .values()
            .fold(0, |acc, a| acc.saturating_add(a.staked))
    }

    fn get_mut(&mut self, id: AgentId) -> DirectoryResult<&mut Agent> {
        self.agents.get_mut(&id).ok_or(DirectoryError::NotFound(id))
    }

    fn owned_mut(&mut self, id: AgentId, caller: &Address) -> DirectoryResult<&mut Agent> {
        let agent = self.get_mut(id)?;
        if &agent.owner != caller {
            return Err(DirectoryError::NotOwner {
                agent: id,
                caller: *caller,
            });
        }
        Ok(agent)
    }
}
