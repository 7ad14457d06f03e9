//! # rb-03-request-ledger
//!
//! Owns research requests and the bounty escrowed against each.
//!
//! ## State Machine
//!
//! ```text
//! [PENDING] ──first report──→ [IN_PROGRESS] ──selection──→ [COMPLETED] ──dispute──→ [DISPUTED]
//!     │                             │
//!     └──cancel (no reports)──→ [CANCELLED]   └──dispute──→ [DISPUTED]
//! ```
//!
//! `Disputed` has no exit: adjudication happens outside this ledger.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Transitions follow the diagram above | `RequestStatus::can_transition_to` |
//! | Report list is append-only | `Request::submitted_reports` only pushed in `record_submission` |
//! | `selected_report` set once, only on InProgress → Completed | `RequestLedger::complete` |
//! | Bounty ≥ minimum, deadline in the future, query non-empty | `RequestLedger::create_request` |

pub mod domain;
pub mod error;
pub mod ledger;

pub use domain::{Request, RequestStatus};
pub use error::{RequestError, RequestResult};
pub use ledger::{NewRequest, RequestLedger};
