use std::{path::Path, time::Duration};

use donation_core::Timeouts;
use donation_ledger_client::{AccountAddress, ModuleId};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{cli::ToFigment, error::Error};

/// Prefix of environment variables that override the configuration file.
pub const ENV_PREFIX: &str = "DONATION_";

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// REST endpoint of the ledger fullnode
    #[serde(default = "default_node_url")]
    #[serde_as(as = "DisplayFromStr")]
    pub node_url: Url,

    /// Account that published the donation module
    #[serde(default = "default_module_address")]
    pub module_address: AccountAddress,

    /// Name of the donation module
    #[serde(default = "default_module_name")]
    pub module_name: String,

    /// Local signing agent. Without one, only read-only commands work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub agent_url: Option<Url>,

    #[serde(default = "default_signing_timeout_secs")]
    pub signing_timeout_secs: u64,

    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Address the status mirror listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Port the status mirror listens on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_node_url() -> Url {
    "https://fullnode.devnet.aptoslabs.com/v1"
        .parse()
        .expect("valid hardcoded URL")
}

fn default_module_address() -> AccountAddress {
    "0xc506346580e6d8b7f72d61f77af400ef015e484c22ed6ab27b1ea93d33812d01"
        .parse()
        .expect("valid hardcoded address")
}

fn default_module_name() -> String {
    "AlumniDonation".to_string()
}

fn default_signing_timeout_secs() -> u64 {
    120
}

fn default_confirmation_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for Config {
    fn default() -> Self {
        Config {
            node_url: default_node_url(),
            module_address: default_module_address(),
            module_name: default_module_name(),
            agent_url: None,
            signing_timeout_secs: default_signing_timeout_secs(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl AsRef<Config> for Config {
    fn as_ref(&self) -> &Config {
        self
    }
}

impl Config {
    /// Layers, lowest precedence first: built-in defaults, the TOML file at `path` (if it
    /// exists), `DONATION_*` environment variables, then arguments given on the command line.
    pub fn load(path: &Path, command: &impl ToFigment) -> Result<Self, Error> {
        let config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(command.to_figment())
            .extract()?;
        Ok(config)
    }

    pub fn module(&self) -> ModuleId {
        ModuleId::new(self.module_address, self.module_name.clone())
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            signing: Duration::from_secs(self.signing_timeout_secs),
            confirmation: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn server_addr(&self) -> (String, u16) {
        (self.bind_addr.clone(), self.port)
    }
}
