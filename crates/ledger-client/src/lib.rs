#![warn(
    clippy::checked_conversions,
    clippy::panic,
    clippy::panic_in_result_fn,
    trivial_casts,
    trivial_numeric_casts,
    rust_2018_idioms,
    unused_lifetimes,
    unused_import_braces,
    unused_qualifications
)]

use std::time::Duration;

use tracing::debug;

pub use address::AccountAddress;
pub use error::{AddressError, Error, ParseIdError};
pub use memory::MemoryLedger;
pub use rest::RestClient;
pub use types::{
    CommittedTx, EntryFunctionId, ModuleId, Resource, StructTag, TransactionRequest, TxHash,
    TxStatus,
};

pub mod address;
pub mod error;
pub mod memory;
pub mod rest;
pub mod types;

/// Read access to a ledger fullnode.
///
/// Submitting transactions is deliberately absent: that requires a private key, which lives in
/// the signing agent. A ledger client only observes.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
    /// Returns every resource stored under `address`.
    ///
    /// An account the ledger has never seen has no resources; that is `Ok(vec![])`, not an error.
    async fn account_resources(&self, address: &AccountAddress) -> Result<Vec<Resource>, Error>;

    /// Looks up a transaction by hash.
    async fn transaction_by_hash(&self, hash: &TxHash) -> Result<TxStatus, Error>;

    /// Polls the node until `hash` has been executed and returns the outcome.
    ///
    /// A transaction the ledger executed but rejected is still `Ok`, with `success == false`.
    /// This never gives up on its own; callers bound it with a timeout.
    async fn wait_for_transaction(
        &self,
        hash: &TxHash,
        poll_interval: Duration,
    ) -> Result<CommittedTx, Error> {
        loop {
            match self.transaction_by_hash(hash).await? {
                TxStatus::Committed(tx) => return Ok(tx),
                TxStatus::Pending | TxStatus::NotFound => {
                    debug!("🔗 Waiting for tx {} to commit... (+{:?})", hash, poll_interval);
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }
}
