use color_eyre::{Report, Result};
use donation_core::{parse_address, Action};

use crate::{cli::Command, error::Error};

#[derive(Clone, Debug)]
pub enum Request {
    Status(StatusRequest),
    Connect(ConnectRequest),
    Run(RunRequest),
    Serve(ServeRequest),
}

#[derive(Clone, Debug)]
pub struct StatusRequest {
    pub address: String,
}

#[derive(Clone, Debug)]
pub struct ConnectRequest;

#[derive(Clone, Debug)]
pub struct RunRequest {
    pub action: Action,
}

#[derive(Clone, Debug)]
pub struct ServeRequest;

impl TryFrom<Command> for Request {
    type Error = Report;

    fn try_from(cmd: Command) -> Result<Self, Self::Error> {
        match cmd {
            Command::Status(args) => {
                parse_address(args.address.trim())
                    .map_err(|e| Error::Argument(e.to_string()))?;
                Ok(Request::Status(StatusRequest {
                    address: args.address.trim().to_string(),
                }))
            }
            Command::Connect(_) => Ok(Request::Connect(ConnectRequest)),
            Command::InitPool(_) => Ok(Request::Run(RunRequest {
                action: Action::InitPool,
            })),
            // validated by the workflow, before anything is sent
            Command::Donate(args) => Ok(Request::Run(RunRequest {
                action: Action::Donate {
                    institution: args.institution,
                    amount: args.amount,
                },
            })),
            Command::Serve(_) => Ok(Request::Serve(ServeRequest)),
        }
    }
}
