use reqwest::{StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, trace};

use crate::{
    address::AccountAddress,
    error::Error,
    types::{CommittedTx, Resource, TxHash, TxStatus},
    LedgerClient,
};

/// [`LedgerClient`] backed by a fullnode's JSON REST API (e.g.
/// `https://fullnode.devnet.aptoslabs.com/v1`).
#[derive(Clone, Debug)]
pub struct RestClient {
    client: reqwest::Client,
    url: Url,
}

impl RestClient {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Url(self.url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<R: DeserializeOwned>(&self, url: Url) -> Result<Reply<R>, Error> {
        trace!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return Ok(Reply::Ok(serde_json::from_slice(&body)?));
        }

        let node_error: NodeError = serde_json::from_slice(&body).unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Ok(Reply::NotFound(node_error));
        }

        Err(Error::Node {
            status: status.as_u16(),
            message: node_error.message,
        })
    }
}

#[async_trait::async_trait]
impl LedgerClient for RestClient {
    async fn account_resources(&self, address: &AccountAddress) -> Result<Vec<Resource>, Error> {
        let url = self.endpoint(&["accounts", &address.to_hex_literal(), "resources"])?;

        match self.get::<Vec<Resource>>(url).await? {
            Reply::Ok(resources) => Ok(resources),
            Reply::NotFound(e) if e.error_code == "account_not_found" => {
                debug!("Account {} not found on ledger", address);
                Ok(vec![])
            }
            Reply::NotFound(e) => Err(Error::Node {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: e.message,
            }),
        }
    }

    async fn transaction_by_hash(&self, hash: &TxHash) -> Result<TxStatus, Error> {
        let url = self.endpoint(&["transactions", "by_hash", hash.as_str()])?;

        match self.get::<RawTransaction>(url).await? {
            Reply::Ok(tx) => tx.try_into(),
            Reply::NotFound(e) if e.error_code == "transaction_not_found" => Ok(TxStatus::NotFound),
            Reply::NotFound(e) => Err(Error::Node {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: e.message,
            }),
        }
    }
}

enum Reply<R> {
    Ok(R),
    NotFound(NodeError),
}

#[derive(Debug, Default, Deserialize)]
struct NodeError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error_code: String,
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    #[serde(rename = "type")]
    kind: String,
    hash: String,
    version: Option<String>,
    success: Option<bool>,
    vm_status: Option<String>,
}

impl TryFrom<RawTransaction> for TxStatus {
    type Error = Error;

    fn try_from(tx: RawTransaction) -> Result<Self, Self::Error> {
        if tx.kind == "pending_transaction" {
            return Ok(TxStatus::Pending);
        }

        let success = tx
            .success
            .ok_or_else(|| Error::Decode(format!("transaction {} has no `success` field", tx.hash)))?;
        let version = tx
            .version
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| Error::Decode(format!("bad version for {}: {}", tx.hash, e)))?;

        Ok(TxStatus::Committed(CommittedTx {
            hash: TxHash::new(tx.hash),
            version,
            success,
            vm_status: tx.vm_status.unwrap_or_default(),
        }))
    }
}
