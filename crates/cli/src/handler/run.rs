use async_trait::async_trait;
use color_eyre::{owo_colors::OwoColorize, Report, Result};
use donation_core::{Action, Refresh};
use tracing::info;

use crate::{
    config::Config,
    handler::{engine, Handler},
    request::RunRequest,
    response::{Response, RunResponse},
};

#[async_trait(?Send)]
impl Handler for RunRequest {
    type Response = Response;

    async fn handle<C: AsRef<Config> + Send>(self, config: C) -> Result<Self::Response, Report> {
        let config = config.as_ref();
        let title = match self.action {
            Action::InitPool => "\nInitializing donation pool",
            Action::Donate { .. } => "\nDonating",
        };
        info!("{}", title.blue().bold());

        let mut engine = engine(config);
        engine.connect().await?;
        let confirmed = engine.run(self.action).await?;

        info!(
            "{} {}",
            "Confirmed".green().bold(),
            confirmed.version.map(|v| format!("at version {v}")).unwrap_or_default()
        );

        Ok(RunResponse {
            hash: confirmed.hash,
            version: confirmed.version,
            pool: confirmed.pool,
            status: match confirmed.refresh {
                Refresh::Updated(status) => Some(status),
                Refresh::Failed(_) => None,
            },
        }
        .into())
    }
}
