//! Report commitment helper.

use sha3::{Digest, Keccak256};
use shared_types::Hash;

/// Keccak-256 over the artifact reference followed by `salt`.
///
/// Researchers may publish this before revealing the artifact. The ledger
/// stores commitments verbatim and never checks them.
pub fn commitment(artifact_ref: &str, salt: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(artifact_ref.as_bytes());
    hasher.update(salt);
    hasher.finalize().into()
}
