use std::path::PathBuf;

use clap::{Parser, Subcommand};
use figment::{providers::Serialized, Figment};
use reqwest::Url;
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use tracing::metadata::LevelFilter;

#[derive(clap::Args, Debug, Clone, Serialize)]
pub struct Verbosity {
    /// Increase verbosity, can be repeated up to 2 times
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Verbosity {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Parser, Serialize)]
#[command(version, long_about = None)]
pub struct Cli {
    /// Increase log verbosity
    #[command(flatten)]
    pub verbose: Verbosity,

    /// Path to a TOML configuration file
    #[arg(long, default_value = "donation.toml")]
    pub config: PathBuf,

    /// Main command
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Serialize, Clone)]
pub enum Command {
    /// Show the donation pool of an institution
    Status(StatusArgs),

    /// Connect to the signing agent and show the connected account's pool
    Connect(ConnectArgs),

    /// Create a donation pool under the connected account
    InitPool(ConnectArgs),

    /// Donate to an institution's pool
    Donate(DonateArgs),

    /// Serve pool status over HTTP
    Serve(ServeArgs),
}

#[serde_as]
#[derive(Debug, Parser, Clone, Serialize)]
pub struct LedgerArgs {
    /// REST endpoint of the ledger fullnode
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub node_url: Option<Url>,

    /// Account that published the donation module
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_address: Option<String>,

    /// Name of the donation module
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

#[serde_as]
#[derive(Debug, Parser, Clone, Serialize)]
pub struct SigningArgs {
    /// URL of the local signing agent
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub agent_url: Option<Url>,

    /// Seconds to wait for the signing agent to connect or approve
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_timeout_secs: Option<u64>,

    /// Seconds to wait for the ledger to confirm a transaction
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_timeout_secs: Option<u64>,

    /// Milliseconds between confirmation polls
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Parser, Clone, Serialize)]
pub struct StatusArgs {
    /// Institution account address
    #[serde(skip)]
    pub address: String,

    #[command(flatten)]
    #[serde(flatten)]
    pub ledger: LedgerArgs,
}

#[derive(Debug, Parser, Clone, Serialize)]
pub struct ConnectArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub ledger: LedgerArgs,

    #[command(flatten)]
    #[serde(flatten)]
    pub signing: SigningArgs,
}

#[derive(Debug, Parser, Clone, Serialize)]
pub struct DonateArgs {
    /// Institution account address
    #[arg(long)]
    #[serde(skip)]
    pub institution: String,

    /// Amount in display units, e.g. 1.5
    #[arg(long)]
    #[serde(skip)]
    pub amount: String,

    #[command(flatten)]
    #[serde(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Debug, Parser, Clone, Serialize)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_addr: Option<String>,

    /// Port to listen on
    #[arg(long, short)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[command(flatten)]
    #[serde(flatten)]
    pub ledger: LedgerArgs,
}

pub trait ToFigment {
    fn to_figment(&self) -> Figment;
}

impl ToFigment for Command {
    fn to_figment(&self) -> Figment {
        match self {
            Command::Status(args) => Figment::from(Serialized::defaults(args)),
            Command::Connect(args) | Command::InitPool(args) => {
                Figment::from(Serialized::defaults(args))
            }
            Command::Donate(args) => Figment::from(Serialized::defaults(args)),
            Command::Serve(args) => Figment::from(Serialized::defaults(args)),
        }
    }
}
