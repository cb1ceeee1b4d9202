use donation_ledger_client::{AccountAddress, TransactionRequest, TxHash};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::Error,
    signing::{Availability, SigningSession, SigningSessionProvider},
};

/// Provider for a wallet agent that exposes a small JSON API on a local port:
///
/// - `POST /connect` → `{"address": "0x…"}`
/// - `POST /sign_and_submit` with `{"payload": <entry function payload>}` → `{"hash": "0x…"}`
///
/// 401 and 403 mean the user declined; the body's `message` is passed through.
#[derive(Clone, Debug)]
pub struct HttpAgent {
    client: reqwest::Client,
    url: Option<Url>,
}

impl HttpAgent {
    pub fn new(url: Option<Url>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait::async_trait]
impl SigningSessionProvider for HttpAgent {
    type Session = AgentSession;

    fn availability(&self) -> Availability {
        match self.url {
            Some(_) => Availability::Available,
            None => Availability::Unavailable,
        }
    }

    async fn connect(&self) -> Result<Self::Session, Error> {
        let url = self.url.as_ref().ok_or_else(|| {
            Error::AgentUnavailable(
                "no signing agent configured; install a wallet agent and set `agent_url`"
                    .to_string(),
            )
        })?;
        let endpoint = endpoint(url, "connect").map_err(Error::AgentUnavailable)?;

        debug!("Connecting to signing agent at {}", url);
        let response = self
            .client
            .post(endpoint)
            .send()
            .await
            .map_err(|e| Error::AgentUnavailable(e.to_string()))?;

        let status = response.status();
        if is_rejection(status) {
            return Err(Error::SessionRejected(message(response).await));
        }
        if !status.is_success() {
            return Err(Error::AgentUnavailable(message(response).await));
        }

        let ConnectResponse { address } = response
            .json()
            .await
            .map_err(|e| Error::AgentUnavailable(format!("unexpected connect response: {e}")))?;
        info!("Signing agent connected account {}", address);

        Ok(AgentSession {
            client: self.client.clone(),
            url: url.clone(),
            account: address,
        })
    }
}

#[derive(Clone, Debug)]
pub struct AgentSession {
    client: reqwest::Client,
    url: Url,
    account: AccountAddress,
}

#[async_trait::async_trait]
impl SigningSession for AgentSession {
    fn account(&self) -> &AccountAddress {
        &self.account
    }

    async fn submit(&self, request: &TransactionRequest) -> Result<TxHash, Error> {
        let endpoint = endpoint(&self.url, "sign_and_submit").map_err(Error::SigningError)?;

        let response = self
            .client
            .post(endpoint)
            .json(&SubmitRequest { payload: request })
            .send()
            .await
            .map_err(|e| Error::SigningError(e.to_string()))?;

        let status = response.status();
        if is_rejection(status) {
            return Err(Error::SigningRejected(message(response).await));
        }
        if !status.is_success() {
            return Err(Error::SigningError(message(response).await));
        }

        let SubmitResponse { hash } = response
            .json()
            .await
            .map_err(|e| Error::SigningError(format!("unexpected submit response: {e}")))?;
        Ok(hash)
    }
}

fn endpoint(base: &Url, path: &str) -> Result<Url, String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| format!("invalid signing agent url: {base}"))?
        .pop_if_empty()
        .push(path);
    Ok(url)
}

fn is_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

async fn message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    agent_message(status, &body)
}

fn agent_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<AgentError>(body)
        .map(|e| e.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.to_string())
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    address: AccountAddress,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    payload: &'a TransactionRequest,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: TxHash,
}

#[derive(Debug, Deserialize)]
struct AgentError {
    message: String,
}
