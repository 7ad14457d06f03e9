//! Driving ports of the marketplace.

pub mod inbound;

pub use inbound::{MarketAdminApi, MarketplaceApi, SelectionOutcome};
