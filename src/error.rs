//! Crate-wide error type.
//!
//! Command-level failures (`WRONGTYPE`, `ERR syntax error`, ...) are NOT represented here — those
//! are ordinary `Frame::Error` reply values produced by `Db` methods and sent back over the wire
//! like any other reply. This type is for failures that abort an operation entirely: a broken
//! socket, a malformed frame the connection can't recover from, a persistence file that can't be
//! opened.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Parse(#[from] crate::parse::ParseError),

    #[error("frame error: {0}")]
    Frame(#[from] crate::frame::Error),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Error {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Other(s)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
