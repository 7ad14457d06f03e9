//! # Shared Types Crate
//!
//! Contains the entities every marketplace component agrees on: addresses,
//! value amounts, sequential identifiers, the authenticated call context and
//! the error taxonomy used to classify failures across crate boundaries.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-component types are defined here.
//! - **Envelope-Only Identity**: the caller identity arrives in a
//!   [`CallContext`] produced by the identity subsystem. Payload fields never
//!   carry a caller address.
//! - **Units**: all value is expressed in the smallest indivisible unit
//!   ([`Amount`]); [`UNIT`] of them make one unit of account.

pub mod context;
pub mod entities;
pub mod errors;
pub mod time;

pub use context::CallContext;
pub use entities::*;
pub use errors::ErrorKind;
pub use time::{ManualClock, SystemTimeSource, TimeSource};
