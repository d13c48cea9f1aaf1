//! `ferrokv`: a single-node, in-memory, RESP-speaking key/value store.
//!
//! The pieces, roughly bottom-up:
//!
//! - [`frame`] and [`parse`] decode the wire protocol; [`connection`] turns a `TcpStream` into a
//!   frame-oriented stream.
//! - [`value`] and [`db`] hold the actual data. [`cmd`] is the command surface laid on top of
//!   [`db::Db`].
//! - [`executor`] is the single-writer actor every command goes through; [`persistence`] is the
//!   append-only log it feeds and the startup replay that rebuilds a `Db` from one.
//! - [`server`] wires accepted connections to the executor and handles graceful shutdown;
//!   [`config`] resolves the settings it starts with.

pub mod cmd;
pub mod config;
mod connection;
pub mod db;
mod error;
pub mod executor;
mod frame;
mod parse;
pub mod persistence;
pub mod server;
mod shutdown;
mod skiplist;
pub mod utils;
mod value;

pub use cmd::Command;
pub use connection::Connection;
pub use db::Db;
pub use error::{Error, Result};
pub use frame::Frame;
pub use parse::{Parse, ParseError};

/// Default TCP port, used when neither the config file nor `--port` set one.
pub const DEFAULT_PORT: u16 = 6379;
