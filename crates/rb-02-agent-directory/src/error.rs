//! Error types for the agent directory.

use rb_01_value_custody::CustodyError;
use shared_types::{Address, AgentId, Amount, ErrorKind};
use thiserror::Error;

/// Agent directory errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("Owner {owner:?} already has {agent}")]
    AlreadyRegistered { owner: Address, agent: AgentId },

    #[error("Stake {stake} below minimum {minimum}")]
    StakeTooLow { stake: Amount, minimum: Amount },

    #[error("Agent name must not be empty")]
    EmptyName,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Agent not found: {0}")]
    NotFound(AgentId),

    #[error("No agent registered for owner {0:?}")]
    NoAgentForOwner(Address),

    #[error("Caller {caller:?} does not own {agent}")]
    NotOwner { agent: AgentId, caller: Address },

    #[error("Capability not recognised by this directory")]
    UnauthorizedCapability,

    #[error("Directory already bound to a marketplace")]
    CapabilityAlreadyBound,

    #[error("{0} must be inactive to withdraw stake")]
    AgentActive(AgentId),

    #[error("{agent} activation already {active}")]
    ActivationUnchanged { agent: AgentId, active: bool },

    #[error("Requested {requested} exceeds staked {staked}")]
    ExceedsStake { requested: Amount, staked: Amount },

    #[error("Remaining stake {remaining} below minimum {minimum}")]
    RemainderBelowMinimum { remaining: Amount, minimum: Amount },

    #[error("Stake overflow")]
    StakeOverflow,

    #[error(transparent)]
    Custody(#[from] CustodyError),
}

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StakeTooLow { .. }
            | Self::EmptyName
            | Self::ZeroAmount
            | Self::NotFound(_)
            | Self::NoAgentForOwner(_)
            | Self::ExceedsStake { .. }
            | Self::RemainderBelowMinimum { .. }
            | Self::StakeOverflow => ErrorKind::Validation,
            Self::NotOwner { .. } | Self::UnauthorizedCapability => ErrorKind::Authorization,
            Self::AlreadyRegistered { .. }
            | Self::CapabilityAlreadyBound
            | Self::AgentActive(_)
            | Self::ActivationUnchanged { .. } => ErrorKind::State,
            Self::Custody(e) => e.kind(),
        }
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
