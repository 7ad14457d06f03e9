//! # Error Classification
//!
//! Each component defines its own error enum; all of them classify into one
//! of these kinds so calling layers can present a specific message without
//! matching on every variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    #[error("validation error")]
    Validation,
    /// Caller is not the required owner, requester or privileged holder.
    #[error("authorization error")]
    Authorization,
    /// Operation not permitted from the current status.
    #[error("state error")]
    State,
    /// The value-transfer subsystem could not complete a movement.
    #[error("transfer error")]
    Transfer,
}
