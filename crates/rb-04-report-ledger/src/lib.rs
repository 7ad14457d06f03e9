//! # rb-04-report-ledger
//!
//! Owns reports submitted against requests: stake custody, winner selection,
//! disputes and slashing.
//!
//! ## State Machine
//!
//! ```text
//! [SUBMITTED] ──select──→ [SELECTED] ──dispute──→ [DISPUTED] ──slash──→ [REJECTED]
//!      │
//!      └── return_stake (request completed, report not chosen): status kept, stake → 0
//! ```
//!
//! ## Value Flow on Selection
//!
//! ```text
//! fee    = bounty * fee_percent / 100      (truncating)
//! reward = bounty - fee
//!
//! Bounty(request)    ──fee──────────→ PlatformFees
//! Bounty(request)    ──reward─┐
//! ReportStake(report)──stake──┴──one delivery──→ researcher
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | One report per (request, researcher) | `ReportLedger::submissions` set |
//! | Stake reaches zero exactly once | `Report::take_stake` |
//! | Ledger state final before any delivery | every release is the last step |
//! | Fee percent ≤ ceiling | `ReportPolicy::set_fee_percent` |

pub mod domain;
pub mod error;
pub mod ledger;

pub use domain::{commitment, FeeSplit, Report, ReportPolicy, ReportStatus, MAX_FEE_PERCENT_CEILING};
pub use error::{ReportError, ReportResult};
pub use ledger::{NewReport, ReportLedger, Selection, StakeSlash};
