use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use donation_ledger_client::{AccountAddress, MemoryLedger, TransactionRequest, TxHash};
use tracing::debug;

use crate::{
    error::Error,
    signing::{Availability, SigningSession, SigningSessionProvider},
};

/// How the simulated user answers a prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Approval {
    Approve,
    Reject(String),
    Fail(String),
    /// Leave the prompt open forever.
    Never,
}

/// A scripted wallet that signs for one account and submits straight into a [`MemoryLedger`].
#[derive(Clone, Debug)]
pub struct MemoryWallet {
    ledger: MemoryLedger,
    account: AccountAddress,
    available: bool,
    on_connect: Approval,
    on_submit: Approval,
    submissions: Arc<AtomicUsize>,
}

impl MemoryWallet {
    pub fn new(ledger: MemoryLedger, account: AccountAddress) -> Self {
        Self {
            ledger,
            account,
            available: true,
            on_connect: Approval::Approve,
            on_submit: Approval::Approve,
            submissions: Arc::default(),
        }
    }

    /// Behaves as if no wallet were installed.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn on_connect(mut self, approval: Approval) -> Self {
        self.on_connect = approval;
        self
    }

    pub fn on_submit(mut self, approval: Approval) -> Self {
        self.on_submit = approval;
        self
    }

    /// Number of transactions that reached the ledger through this wallet's sessions.
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SigningSessionProvider for MemoryWallet {
    type Session = MemoryWalletSession;

    fn availability(&self) -> Availability {
        if self.available {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }

    async fn connect(&self) -> Result<Self::Session, Error> {
        if !self.available {
            return Err(Error::AgentUnavailable("wallet not installed".to_string()));
        }
        answer(&self.on_connect, Error::SessionRejected, Error::AgentUnavailable).await?;

        Ok(MemoryWalletSession {
            ledger: self.ledger.clone(),
            account: self.account,
            on_submit: self.on_submit.clone(),
            submissions: self.submissions.clone(),
        })
    }
}

#[derive(Clone, Debug)]
pub struct MemoryWalletSession {
    ledger: MemoryLedger,
    account: AccountAddress,
    on_submit: Approval,
    submissions: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl SigningSession for MemoryWalletSession {
    fn account(&self) -> &AccountAddress {
        &self.account
    }

    async fn submit(&self, request: &TransactionRequest) -> Result<TxHash, Error> {
        answer(&self.on_submit, Error::SigningRejected, Error::SigningError).await?;

        let hash = self.ledger.submit(&self.account, request);
        self.submissions.fetch_add(1, Ordering::SeqCst);
        debug!("Wallet {} submitted {}", self.account, hash);
        Ok(hash)
    }
}

async fn answer(
    approval: &Approval,
    rejected: fn(String) -> Error,
    failed: fn(String) -> Error,
) -> Result<(), Error> {
    match approval {
        Approval::Approve => Ok(()),
        Approval::Reject(message) => Err(rejected(message.clone())),
        Approval::Fail(message) => Err(failed(message.clone())),
        Approval::Never => std::future::pending().await,
    }
}
