use async_trait::async_trait;
use color_eyre::{owo_colors::OwoColorize, Report, Result};
use donation_core::{parse_address, workflow::describe, PoolStatusService};
use tracing::info;

use crate::{
    config::Config,
    handler::{gateway, Handler},
    request::StatusRequest,
    response::{Response, StatusResponse},
};

#[async_trait(?Send)]
impl Handler for StatusRequest {
    type Response = Response;

    async fn handle<C: AsRef<Config> + Send>(self, config: C) -> Result<Self::Response, Report> {
        let config = config.as_ref();
        let address = parse_address(&self.address)?;

        let status = gateway(config).pool_status(&self.address).await?;
        info!("{} {}", address.to_string().bold(), describe(&status));

        Ok(StatusResponse { address, status }.into())
    }
}
