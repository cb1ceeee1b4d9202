use async_trait::async_trait;
use color_eyre::{owo_colors::OwoColorize, Report, Result};
use donation_core::workflow::describe;
use tracing::info;

use crate::{
    config::Config,
    handler::{engine, Handler},
    request::ConnectRequest,
    response::{ConnectResponse, Response},
};

#[async_trait(?Send)]
impl Handler for ConnectRequest {
    type Response = Response;

    async fn handle<C: AsRef<Config> + Send>(self, config: C) -> Result<Self::Response, Report> {
        let config = config.as_ref();
        info!("{}", "\nConnecting to signing agent".blue().bold());

        let mut engine = engine(config);
        let account = engine.connect().await?;
        let status = engine.pool(&account);
        if let Some(status) = &status {
            info!("{} {}", account.to_string().bold(), describe(status));
        }

        Ok(ConnectResponse { account, status }.into())
    }
}
