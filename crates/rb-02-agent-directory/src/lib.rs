//! # rb-02-agent-directory
//!
//! Registry of research agents: stake, activation, reputation, accuracy and
//! verification.
//!
//! ## Security Model
//!
//! | Operation | Authorized caller |
//! |-----------|-------------------|
//! | `register_agent` | anyone without an agent (one per owner) |
//! | `increase_stake`, `withdraw_stake`, `deactivate_agent`, `reactivate_agent` | agent owner |
//! | `update_agent_reputation` | holder of the bound [`ReputationCapability`] |
//! | `slash_stake` | administrator (checked by the facade) |
//!
//! The capability is minted exactly once by [`AgentDirectory::bind_marketplace`]
//! and cannot be cloned or constructed elsewhere; the directory compares the
//! presented token against the one it bound.
//!
//! ## Verification
//!
//! ```text
//! reputation ≥ threshold ──(any reputation update)──→ is_verified = true   (never reverts)
//! ```

pub mod directory;
pub mod domain;
pub mod error;

pub use directory::{AgentDirectory, AgentSlash, DirectoryPolicy, ReputationChange};
pub use domain::{Agent, ReputationCapability, INITIAL_ACCURACY_BPS, MAX_ACCURACY_BPS};
pub use error::{DirectoryError, DirectoryResult};
