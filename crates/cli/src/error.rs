use displaydoc::Display;
use thiserror::Error;

#[derive(Debug, Display, Error)]
pub enum Error {
    /// Config error: {0}
    Config(#[from] figment::Error),
    /// Invalid argument: {0}
    Argument(String),
}
