//! In-memory external wallets.
//!
//! Stands in for the value-transfer subsystem in single-process deployments
//! and simulations. Recipients can be configured to reject receipt, or to run
//! a hook on receipt (which is how re-entrant recipients are simulated).

use crate::ports::{TransferFailure, ValueTransferGateway};
use parking_lot::RwLock;
use shared_types::{short_address, Address, Amount};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Code run when a wallet receives value. Returning `Err` rejects receipt.
pub trait ReceiveHook: Send + Sync {
    fn on_receive(&self, amount: Amount) -> Result<(), String>;
}

/// External wallet balances.
#[derive(Default)]
pub struct InMemoryWallets {
    balances: RwLock<HashMap<Address, Amount>>,
    rejecting: RwLock<HashSet<Address>>,
    hooks: RwLock<HashMap<Address, Arc<dyn ReceiveHook>>>,
    deliveries: AtomicU64,
}

impl InMemoryWallets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` into `address` (test and genesis funding).
    pub fn fund(&self, address: Address, amount: Amount) {
        let mut balances = self.balances.write();
        let entry = balances.entry(address).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.read().get(address).copied().unwrap_or(0)
    }

    /// Make `address` refuse every incoming delivery.
    pub fn reject_receipts(&self, address: Address) {
        self.rejecting.write().insert(address);
    }

    pub fn accept_receipts(&self, address: Address) {
        self.rejecting.write().remove(&address);
    }

    /// Run `hook` whenever `address` receives value.
    pub fn set_hook(&self, address: Address, hook: Arc<dyn ReceiveHook>) {
        self.hooks.write().insert(address, hook);
    }

    /// Number of successful deliveries so far.
    pub fn deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }
}

impl ValueTransferGateway for InMemoryWallets {
    fn collect(&self, from: Address, amount: Amount) -> Result<(), TransferFailure> {
        let mut balances = self.balances.write();
        let available = balances.get(&from).copied().unwrap_or(0);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or(TransferFailure::InsufficientFunds {
                    address: from,
                    available,
                    requested: amount,
                })?;
        balances.insert(from, remaining);
        Ok(())
    }

    fn deliver(&self, to: Address, amount: Amount) -> Result<(), TransferFailure> {
        if self.rejecting.read().contains(&to) {
            return Err(TransferFailure::Rejected {
                address: to,
                reason: "receipt refused".to_string(),
            });
        }

        // No wallet lock is held while recipient code runs.
        let hook = self.hooks.read().get(&to).cloned();
        if let Some(hook) = hook {
            hook.on_receive(amount)
                .map_err(|reason| TransferFailure::Rejected { address: to, reason })?;
        }

        self.fund(to, amount);
        self.deliveries.fetch_add(1, Ordering::Relaxed);
        debug!(to = %short_address(&to), amount, "Wallet credited");
        Ok(())
    }
}
