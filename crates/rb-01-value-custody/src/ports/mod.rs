//! Driven port: the external value-transfer subsystem.

pub mod outbound;

pub use outbound::{TransferFailure, ValueTransferGateway};
