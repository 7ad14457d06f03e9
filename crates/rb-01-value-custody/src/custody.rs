//! Value Custody - bucketed escrow over an external transfer gateway.

use crate::domain::CustodyBucket;
use crate::error::{CustodyError, CustodyResult};
use crate::ports::ValueTransferGateway;
use shared_types::{short_address, Address, Amount};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// An outgoing transfer staged while deliveries are deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDelivery {
    pub to: Address,
    pub amount: Amount,
}

/// Holds and moves value for the marketplace ledgers.
///
/// Cloning is cheap relative to the ledgers (one map plus an `Arc`), which
/// lets the facade run each operation against a working copy.
#[derive(Clone)]
pub struct ValueCustody {
    balances: HashMap<CustodyBucket, Amount>,
    total_held: Amount,
    gateway: Arc<dyn ValueTransferGateway>,
    /// `Some` while deliveries are staged instead of sent.
    deferred: Option<Vec<PendingDelivery>>,
}

impl fmt::Debug for ValueCustody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCustody")
            .field("buckets", &self.balances.len())
            .field("total_held", &self.total_held)
            .field("deferred", &self.deferred.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl ValueCustody {
    pub fn new(gateway: Arc<dyn ValueTransferGateway>) -> Self {
        Self {
            balances: HashMap::new(),
            total_held: 0,
            gateway,
            deferred: None,
        }
    }

    /// Stage deliveries from now on; buckets are still debited immediately.
    pub fn defer_deliveries(&mut self) {
        self.deferred.get_or_insert_with(Vec::new);
    }

    /// Stop deferring and hand back whatever was staged.
    pub fn take_deliveries(&mut self) -> Vec<PendingDelivery> {
        self.deferred.take().unwrap_or_default()
    }

    pub fn gateway(&self) -> Arc<dyn ValueTransferGateway> {
        Arc::clone(&self.gateway)
    }

    /// Accept `amount` from `from` into `bucket`.
    pub fn hold(&mut self, from: Address, bucket: CustodyBucket, amount: Amount) -> CustodyResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.credit(bucket, amount)?;
        self.gateway.collect(from, amount).map_err(|failure| {
            warn!(from = %short_address(&from), %bucket, amount, %failure, "Collection failed");
            CustodyError::from(failure)
        })?;
        debug!(from = %short_address(&from), %bucket, amount, "Value held");
        Ok(())
    }

    /// Debit `bucket` and deliver `amount` to `destination`.
    pub fn release(
        &mut self,
        bucket: CustodyBucket,
        destination: Address,
        amount: Amount,
    ) -> CustodyResult<()> {
        self.release_combined(&[(bucket, amount)], destination)
            .map(|_| ())
    }

    /// Debit every part, then deliver the sum in a single transfer.
    pub fn release_combined(
        &mut self,
        parts: &[(CustodyBucket, Amount)],
        destination: Address,
    ) -> CustodyResult<Amount> {
        let mut total: Amount = 0;
        for &(bucket, amount) in parts {
            self.debit(bucket, amount)?;
            total = total.checked_add(amount).ok_or(CustodyError::Overflow { bucket, amount })?;
        }
        if total == 0 {
            debug!(to = %short_address(&destination), "Zero-value release skipped");
            return Ok(0);
        }
        let delivery = PendingDelivery {
            to: destination,
            amount: total,
        };
        if let Some(staged) = self.deferred.as_mut() {
            staged.push(delivery);
            debug!(to = %short_address(&destination), amount = total, "Delivery staged");
            return Ok(total);
        }
        deliver(self.gateway.as_ref(), delivery)?;
        debug!(to = %short_address(&destination), amount = total, parts = parts.len(), "Value released");
        Ok(total)
    }

    /// Move value between buckets without leaving custody.
    pub fn reassign(
        &mut self,
        from: CustodyBucket,
        to: CustodyBucket,
        amount: Amount,
    ) -> CustodyResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        debug!(%from, %to, amount, "Value reassigned");
        Ok(())
    }

    pub fn balance_of(&self, bucket: CustodyBucket) -> Amount {
        self.balances.get(&bucket).copied().unwrap_or(0)
    }

    pub fn total_held(&self) -> Amount {
        self.total_held
    }

    /// `total_held` equals the sum of all buckets.
    pub fn is_balanced(&self) -> bool {
        self.balances
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
            .is_some_and(|sum| sum == self.total_held)
    }

    fn credit(&mut self, bucket: CustodyBucket, amount: Amount) -> CustodyResult<()> {
        let current = self.balance_of(bucket);
        let updated = current
            .checked_add(amount)
            .ok_or(CustodyError::Overflow { bucket, amount })?;
        let total = self
            .total_held
            .checked_add(amount)
            .ok_or(CustodyError::Overflow { bucket, amount })?;
        self.balances.insert(bucket, updated);
        self.total_held = total;
        Ok(())
    }

    fn debit(&mut self, bucket: CustodyBucket, amount: Amount) -> CustodyResult<()> {
        let available = self.balance_of(bucket);
        let remaining = available
            .checked_sub(amount)
            .ok_or(CustodyError::InsufficientCustody {
                bucket,
                available,
                requested: amount,
            })?;
        if remaining == 0 {
            self.balances.remove(&bucket);
        } else {
            self.balances.insert(bucket, remaining);
        }
        // total_held >= available >= amount while balanced
        self.total_held = self.total_held.saturating_sub(amount);
        Ok(())
    }
}

/// Send one delivery through the gateway.
pub fn deliver(gateway: &dyn ValueTransferGateway, delivery: PendingDelivery) -> CustodyResult<()> {
    let PendingDelivery { to, amount } = delivery;
    gateway.deliver(to, amount).map_err(|failure| {
        warn!(to = %short_address(&to), amount, %failure, "Delivery failed");
        CustodyError::from(failure)
    })
}
