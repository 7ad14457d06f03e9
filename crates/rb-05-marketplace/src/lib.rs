//! # rb-05-marketplace
//!
//! The coordinating surface of the marketplace. Sequences request and report
//! ledger operations over a shared custody, issues the single privileged
//! reputation call into the agent directory, and publishes notifications.
//!
//! ## Transaction Model
//!
//! ```text
//!   caller ──→ lock ──→ in-flight? ──yes──→ ReentrantCall (nothing changes)
//!                          │ no
//!                          ▼
//!              clone committed state ──→ run operation on the copy
//!                                              │
//!                          ┌───── Ok ──────────┴────────── Err ─────┐
//!                          ▼                                        ▼
//!                 copy becomes committed                      copy discarded
//!                          │
//!                          ▼
//!                 publish notifications
//! ```
//!
//! Every operation is all-or-nothing. The one external call an operation makes
//! (the value delivery) is its last step, and a recipient that calls back into
//! the marketplace while that delivery is running is refused.
//!
//! ## Security Model
//!
//! | Surface | Caller |
//! |---------|--------|
//! | [`MarketplaceApi`] | any authenticated caller, per-operation owner checks |
//! | [`MarketAdminApi`] | the administrator named in [`MarketConfig`] |
//! | reputation update | this facade only, via its bound capability |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod ports;
pub mod service;
pub mod state;

pub use config::MarketConfig;
pub use error::{MarketError, MarketResult};
pub use ports::{MarketAdminApi, MarketplaceApi, SelectionOutcome};
pub use service::MarketplaceService;
pub use state::MarketState;
