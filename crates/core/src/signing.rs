use donation_ledger_client::{AccountAddress, TransactionRequest, TxHash};

use crate::error::Error;

pub mod agent;
pub mod memory;

/// Whether a signing agent can be reached at all. Reported synchronously, before any connection
/// attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

/// Entry point to a key-holding signing agent (a wallet).
#[async_trait::async_trait]
pub trait SigningSessionProvider: Send + Sync {
    type Session: SigningSession;

    /// Cheap capability check; must not perform I/O.
    fn availability(&self) -> Availability;

    /// Asks the agent for an authenticated session. May wait for the user to consent out of
    /// process.
    ///
    /// Fails with [`Error::SessionRejected`] when the user declines, or
    /// [`Error::AgentUnavailable`] when the agent cannot be reached.
    async fn connect(&self) -> Result<Self::Session, Error>;
}

/// An authenticated session with a signing agent.
///
/// The session is an opaque capability: it knows which account it signs for and can get a
/// transaction signed and submitted, nothing more.
#[async_trait::async_trait]
pub trait SigningSession: Send + Sync {
    fn account(&self) -> &AccountAddress;

    /// Has the agent sign `request` and submit it to the ledger. May wait for user approval
    /// out of process.
    ///
    /// Fails with [`Error::SigningRejected`] when the user declines, or [`Error::SigningError`]
    /// for anything else that goes wrong inside the agent. The agent's message is kept verbatim.
    async fn submit(&self, request: &TransactionRequest) -> Result<TxHash, Error>;
}
