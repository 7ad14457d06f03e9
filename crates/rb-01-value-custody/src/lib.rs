//! # rb-01-value-custody
//!
//! Leaf component that holds native value on behalf of the ledgers.
//!
//! ## Overview
//!
//! Value is kept in named buckets, one per escrowed obligation:
//!
//! | Bucket | Owner component | Filled by | Emptied by |
//! |--------|-----------------|-----------|------------|
//! | `Bounty(request)` | Request ledger | create request | cancel, select |
//! | `ReportStake(report)` | Report ledger | submit report | return stake, select, slash |
//! | `AgentStake(agent)` | Agent directory | register, top-up | withdraw, slash |
//! | `PlatformFees` | Report ledger | select, slash | fee withdrawal |
//!
//! ## Atomicity
//!
//! ```text
//! hold:    credit bucket ──→ gateway.collect(from)   (fails → caller discards state)
//! release: debit bucket  ──→ gateway.deliver(to)     (fails → caller discards state)
//! ```
//!
//! Internal balances are always mutated before the gateway is called, so a
//! recipient that re-enters observes buckets already debited. The caller owns
//! rollback: on any error the enclosing operation discards its working copy.
//!
//! With [`ValueCustody::defer_deliveries`] the debit still happens at once but
//! the delivery is staged. The facade sends staged deliveries with
//! [`deliver`] after every ledger has reached its final state.
//!
//! ## Invariant
//!
//! `total_held == Σ buckets` after every successful call ([`ValueCustody::is_balanced`]).

pub mod adapters;
pub mod custody;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::{InMemoryWallets, ReceiveHook};
pub use custody::{deliver, PendingDelivery, ValueCustody};
pub use domain::CustodyBucket;
pub use error::{CustodyError, CustodyResult};
pub use ports::{TransferFailure, ValueTransferGateway};
