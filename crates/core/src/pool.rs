use displaydoc::Display;
use donation_ledger_client::{AccountAddress, LedgerClient, ModuleId, Resource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Error;

/// Name of the resource the donation module publishes under an institution's account.
pub const POOL_RESOURCE: &str = "DonationPool";

/// Snapshot of an institution's donation pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
    pub initialized: bool,
    /// Sum of all confirmed donations, in base units.
    pub total_donations: u64,
}

impl PoolStatus {
    pub const UNINITIALIZED: PoolStatus = PoolStatus {
        initialized: false,
        total_donations: 0,
    };
}

/// Parses a user-supplied account address. Performs no I/O.
pub fn parse_address(input: &str) -> Result<AccountAddress, Error> {
    input
        .parse()
        .map_err(|_| Error::InvalidAddress(input.to_string()))
}

/// Reads donation pool state straight from the ledger.
#[derive(Clone, Debug)]
pub struct PoolGateway<L> {
    ledger: L,
    module: ModuleId,
}

impl<L: LedgerClient> PoolGateway<L> {
    pub fn new(ledger: L, module: ModuleId) -> Self {
        Self { ledger, module }
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    /// Fetches the pool stored under `address`.
    ///
    /// An account without the pool resource, including one the ledger has never seen, is
    /// reported as [`PoolStatus::UNINITIALIZED`]. Only an unreachable node or a response that
    /// cannot be understood is an error.
    pub async fn fetch_pool_status(&self, address: &AccountAddress) -> Result<PoolStatus, Error> {
        let tag = self.module.struct_tag(POOL_RESOURCE);
        let resources = self.ledger.account_resources(address).await?;

        let Some(pool) = resources.iter().find(|r| r.is(&tag)) else {
            debug!("No {} under {}", tag, address);
            return Ok(PoolStatus::UNINITIALIZED);
        };

        Ok(PoolStatus {
            initialized: true,
            total_donations: total_donations(pool)?,
        })
    }
}

// u64 fields come back as decimal strings from the REST API; accept bare numbers too.
fn total_donations(pool: &Resource) -> Result<u64, Error> {
    let field = &pool.data["total_donations"];
    field
        .as_str()
        .and_then(|s| s.parse().ok())
        .or_else(|| field.as_u64())
        .ok_or_else(|| {
            Error::LedgerUnavailable(format!(
                "malformed {} resource: total_donations = {}",
                pool.type_tag, field
            ))
        })
}

/// Failure of a pool status lookup, scoped to the address it was made for.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum StatusError {
    /// invalid account address `{0}`
    InvalidAddress(String),
    /// pool status for {address} unavailable: {reason}
    Unavailable {
        address: AccountAddress,
        reason: String,
    },
}

impl From<StatusError> for Error {
    fn from(e: StatusError) -> Self {
        match e {
            StatusError::InvalidAddress(address) => Error::InvalidAddress(address),
            StatusError::Unavailable { reason, .. } => Error::LedgerUnavailable(reason),
        }
    }
}

/// Request/response access to pool state, keyed by the address as the caller typed it.
///
/// Implementations are stateless and read-only, so the same service may be shared by the HTTP
/// mirror and any number of workflows.
#[async_trait::async_trait]
pub trait PoolStatusService: Send + Sync {
    async fn pool_status(&self, address: &str) -> Result<PoolStatus, StatusError>;
}

#[async_trait::async_trait]
impl<L: LedgerClient> PoolStatusService for PoolGateway<L> {
    async fn pool_status(&self, address: &str) -> Result<PoolStatus, StatusError> {
        let parsed = parse_address(address)
            .map_err(|_| StatusError::InvalidAddress(address.to_string()))?;

        self.fetch_pool_status(&parsed).await.map_err(|e| {
            warn!("Pool status lookup for {} failed: {}", parsed, e);
            StatusError::Unavailable {
                address: parsed,
                reason: e.to_string(),
            }
        })
    }
}
