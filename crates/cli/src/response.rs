use donation_core::PoolStatus;
use donation_ledger_client::{AccountAddress, TxHash};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub enum Response {
    Status(StatusResponse),
    Connect(ConnectResponse),
    Run(RunResponse),
    Serve,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub address: AccountAddress,
    pub status: PoolStatus,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub account: AccountAddress,
    pub status: Option<PoolStatus>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub hash: TxHash,
    pub version: Option<u64>,
    pub pool: AccountAddress,
    /// `None` when the pool could not be re-read after confirmation.
    pub status: Option<PoolStatus>,
}

impl From<StatusResponse> for Response {
    fn from(response: StatusResponse) -> Self {
        Response::Status(response)
    }
}

impl From<ConnectResponse> for Response {
    fn from(response: ConnectResponse) -> Self {
        Response::Connect(response)
    }
}

impl From<RunResponse> for Response {
    fn from(response: RunResponse) -> Self {
        Response::Run(response)
    }
}
