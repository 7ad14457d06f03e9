//! Privileged reputation-update capability.

use std::fmt;
use uuid::Uuid;

/// Proof that the holder is the marketplace bound to this directory.
///
/// Not `Clone`, no public constructor: the only way to obtain one is
/// `AgentDirectory::bind_marketplace`, which succeeds once.
pub struct ReputationCapability {
    token: Uuid,
}

impl ReputationCapability {
    pub(crate) fn mint() -> Self {
        Self {
            token: Uuid::new_v4(),
        }
    }

    pub(crate) fn token(&self) -> Uuid {
        self.token
    }
}

impl fmt::Debug for ReputationCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReputationCapability(..)")
    }
}
