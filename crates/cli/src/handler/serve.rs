use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::{owo_colors::OwoColorize, Report, Result};
use donation_server::{start_server, SharedService};
use tracing::info;

use crate::{
    config::Config,
    handler::{gateway, Handler},
    request::ServeRequest,
    response::Response,
};

#[async_trait(?Send)]
impl Handler for ServeRequest {
    type Response = Response;

    async fn handle<C: AsRef<Config> + Send>(self, config: C) -> Result<Self::Response, Report> {
        let config = config.as_ref();
        info!(
            "{} {} ({})",
            "\nServing pool status from".blue().bold(),
            config.node_url,
            config.module()
        );

        let service: SharedService = Arc::new(gateway(config));
        start_server(service, config.server_addr()).await?;

        Ok(Response::Serve)
    }
}
