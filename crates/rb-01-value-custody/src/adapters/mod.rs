//! Adapters for the value-transfer port.

pub mod wallets;

pub use wallets::{InMemoryWallets, ReceiveHook};
