use std::fmt;

use displaydoc::Display;
use donation_ledger_client::TxHash;
use thiserror::Error;

/// Everything that can end a donation workflow.
///
/// The first three variants are detected locally before any network traffic; the rest come from
/// the signing agent or the ledger node.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum Error {
    /// invalid account address `{0}`
    InvalidAddress(String),
    /// invalid donation amount `{0}`: enter a positive number
    InvalidAmount(String),
    /// no signing session; connect a wallet first
    NoSession,
    /// signing agent refused the connection: {0}
    SessionRejected(String),
    /// signing agent unavailable: {0}
    AgentUnavailable(String),
    /// transaction rejected in the signing agent: {0}
    SigningRejected(String),
    /// signing agent failed to submit the transaction: {0}
    SigningError(String),
    /// ledger node unavailable: {0}
    LedgerUnavailable(String),
    /// transaction {hash} was rejected by the ledger: {vm_status}
    TransactionFailed { hash: TxHash, vm_status: String },
    /// timed out {0}
    Timeout(Stage),
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidAddress(_) | Error::InvalidAmount(_) | Error::NoSession => {
                ErrorCategory::Validation
            }
            Error::SessionRejected(_) | Error::AgentUnavailable(_) => ErrorCategory::Session,
            Error::SigningRejected(_) | Error::SigningError(_) => ErrorCategory::Signing,
            Error::LedgerUnavailable(_) => ErrorCategory::Network,
            Error::TransactionFailed { .. } => ErrorCategory::OnChain,
            Error::Timeout(_) => ErrorCategory::Timeout,
        }
    }
}

impl From<donation_ledger_client::Error> for Error {
    fn from(e: donation_ledger_client::Error) -> Self {
        Error::LedgerUnavailable(e.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Session,
    Signing,
    Network,
    OnChain,
    Timeout,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Validation => "invalid input",
            ErrorCategory::Session => "wallet connection error",
            ErrorCategory::Signing => "signing error",
            ErrorCategory::Network => "network error",
            ErrorCategory::OnChain => "rejected on-chain",
            ErrorCategory::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// The suspension point a timeout interrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Connecting,
    AwaitingSignature,
    Confirming,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Connecting => "waiting for the signing agent to connect",
            Stage::AwaitingSignature => "waiting for the signing agent to approve",
            Stage::Confirming => "waiting for ledger confirmation",
        };
        f.write_str(s)
    }
}
