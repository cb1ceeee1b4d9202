use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address `{0}` must start with 0x")]
    MissingPrefix(String),
    #[error("address `{0}` must have between 1 and 64 hex digits")]
    Length(String),
    #[error("address `{0}` contains non-hex characters")]
    NotHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    #[error("malformed identifier `{0}`: expected <address>::<module>[::<name>]")]
    Shape(String),
    #[error("malformed identifier: {0}")]
    Address(#[from] AddressError),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("request to ledger node failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("ledger node responded with {status}: {message}")]
    Node { status: u16, message: String },
    #[error("malformed ledger response: {0}")]
    Decode(String),
    #[error("invalid ledger node url: {0}")]
    Url(String),
    #[error("node unreachable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}
