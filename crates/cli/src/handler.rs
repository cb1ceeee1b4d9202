use async_trait::async_trait;
use color_eyre::{Report, Result};
use donation_core::{signing::agent::HttpAgent, PoolGateway, TracingSink, WorkflowEngine};
use donation_ledger_client::RestClient;

use crate::{config::Config, request::Request, response::Response};

// commands
pub mod connect;
pub mod run;
pub mod serve;
pub mod status;

#[async_trait(?Send)]
pub trait Handler {
    type Response;

    async fn handle<C: AsRef<Config> + Send>(self, config: C) -> Result<Self::Response, Report>;
}

#[async_trait(?Send)]
impl Handler for Request {
    type Response = Response;

    async fn handle<C: AsRef<Config> + Send>(self, config: C) -> Result<Self::Response, Report> {
        match self {
            Request::Status(request) => request.handle(config).await,
            Request::Connect(request) => request.handle(config).await,
            Request::Run(request) => request.handle(config).await,
            Request::Serve(request) => request.handle(config).await,
        }
    }
}

pub type Engine = WorkflowEngine<HttpAgent, RestClient, PoolGateway<RestClient>, TracingSink>;

pub fn gateway(config: &Config) -> PoolGateway<RestClient> {
    PoolGateway::new(RestClient::new(config.node_url.clone()), config.module())
}

pub fn engine(config: &Config) -> Engine {
    let ledger = RestClient::new(config.node_url.clone());
    WorkflowEngine::new(
        HttpAgent::new(config.agent_url.clone()),
        ledger.clone(),
        PoolGateway::new(ledger, config.module()),
        TracingSink,
        config.module(),
    )
    .with_timeouts(config.timeouts())
}
