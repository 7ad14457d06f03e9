//! Error types for the marketplace facade.

use rb_01_value_custody::CustodyError;
use rb_02_agent_directory::DirectoryError;
use rb_03_request_ledger::RequestError;
use rb_04_report_ledger::ReportError;
use shared_types::{Address, Amount, ErrorKind};
use thiserror::Error;

/// Every way a marketplace operation can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    #[error(transparent)]
    Custody(#[from] CustodyError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Caller {caller:?} is not the administrator")]
    Unauthorized { caller: Address },

    #[error("Marketplace is paused")]
    Paused,

    #[error("Marketplace pause flag already {paused}")]
    PauseUnchanged { paused: bool },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Recipient must not be the zero address")]
    ZeroRecipient,

    #[error("Disputes carry no value, {attached} attached")]
    DisputeCarriesValue { attached: Amount },

    #[error("Re-entrant call to {operation} while another operation is in flight")]
    ReentrantCall { operation: &'static str },
}

impl MarketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Custody(e) => e.kind(),
            Self::Directory(e) => e.kind(),
            Self::Request(e) => e.kind(),
            Self::Report(e) => e.kind(),
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::InvalidConfig(_) | Self::ZeroRecipient | Self::DisputeCarriesValue { .. } => {
                ErrorKind::Validation
            }
            Self::Paused | Self::PauseUnchanged { .. } | Self::ReentrantCall { .. } => {
                ErrorKind::State
            }
        }
    }
}

/// Result type for marketplace operations.
pub type MarketResult<T> = Result<T, MarketError>;
