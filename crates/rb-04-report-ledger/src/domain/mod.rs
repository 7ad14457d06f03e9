//! Domain module for the report ledger.
//!
//! - report: Report entity and status transitions
//! - fee: Fee split and policy bounds
//! - commitment: Keccak-256 commitment helper

pub mod commitment;
pub mod fee;
pub mod report;

pub use commitment::commitment;
pub use fee::{FeeSplit, ReportPolicy, MAX_FEE_PERCENT_CEILING};
pub use report::{Report, ReportStatus};
