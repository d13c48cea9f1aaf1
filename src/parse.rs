//! A cursor-like API over an already-parsed `Frame::Array`, used by every `cmd::*` type to pull
//! out typed arguments without each command hand-rolling the same `VecDeque` bookkeeping.

use crate::Frame;
use bytes::Bytes;
use std::fmt;
use std::vec;

/// Cursor over the elements of a frame.
#[derive(Debug)]
pub struct Parse {
    parts: vec::IntoIter<Frame>,
}

#[derive(Debug)]
pub enum ParseError {
    /// Attempted to extract a value, but the frame array has been fully consumed.
    EndOfStream,
    Other(String),
}

impl Parse {
    /// `frame` must be `Frame::Array`; anything else is a protocol-level error (the request
    /// path only ever sends arrays of bulk strings).
    pub fn new(frame: Frame) -> Result<Parse, ParseError> {
        let array = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(ParseError::Other(format!(
                    "protocol error; expected array, got {frame:?}"
                )))
            }
        };

        Ok(Parse {
            parts: array.into_iter(),
        })
    }

    fn next(&mut self) -> Result<Frame, ParseError> {
        self.parts.next().ok_or(ParseError::EndOfStream)
    }

    /// Returns the next entry as a `String`.
    pub fn next_string(&mut self) -> Result<String, ParseError> {
        match self.next()? {
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(data) => String::from_utf8(data.to_vec())
                .map_err(|_| ParseError::Other("protocol error; invalid string".into())),
            frame => Err(ParseError::Other(format!(
                "protocol error; expected simple frame or bulk frame, got {frame:?}"
            ))),
        }
    }

    /// Returns the next entry as raw bytes.
    pub fn next_bytes(&mut self) -> Result<Bytes, ParseError> {
        match self.next()? {
            Frame::Simple(s) => Ok(Bytes::from(s.into_bytes())),
            Frame::Bulk(data) => Ok(data),
            frame => Err(ParseError::Other(format!(
                "protocol error; expected simple frame or bulk frame, got {frame:?}"
            ))),
        }
    }

    /// Returns the next entry as a signed 64-bit integer.
    ///
    /// Accepts `Integer` frames directly, and `Bulk`/`Simple` frames whose text parses as an
    /// integer (the request path sends everything as bulk strings).
    pub fn next_int(&mut self) -> Result<i64, ParseError> {
        use atoi::atoi;

        const MSG: &str = "protocol error; invalid number";

        match self.next()? {
            Frame::Integer(n) => Ok(n),
            Frame::Simple(s) => atoi(s.as_bytes()).ok_or_else(|| ParseError::Other(MSG.into())),
            Frame::Bulk(data) => atoi(&data).ok_or_else(|| ParseError::Other(MSG.into())),
            frame => Err(ParseError::Other(format!(
                "protocol error; expected int frame, got {frame:?}"
            ))),
        }
    }

    /// Returns `true` if no arguments remain, without consuming anything.
    pub fn check_finish(&self) -> bool {
        self.parts.as_slice().is_empty()
    }

    /// Confirms there are no more arguments remaining, erroring otherwise.
    pub fn finish(&mut self) -> Result<(), ParseError> {
        if self.parts.next().is_none() {
            Ok(())
        } else {
            Err(ParseError::Other("protocol error; expected end of frame".into()))
        }
    }
}

impl std::error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::EndOfStream => "protocol error; unexpected end of stream".fmt(f),
            ParseError::Other(msg) => msg.fmt(f),
        }
    }
}
