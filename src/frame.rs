//! RESP reply values and their bit-exact wire encoding.
//!
//! A `Frame` is the unit both directions of the wire speak: connections parse inbound request
//! frames (always arrays of bulk strings, see [`crate::connection`]) and commands produce
//! outbound reply frames of any variant.

use bytes::{Buf, Bytes};
use std::fmt;
use std::io::Cursor;

/// A single RESP value, in or out.
#[derive(Clone, Debug)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
    NullArray,
}

impl Frame {
    /// An empty array, ready to have elements pushed onto it.
    pub fn array() -> Frame {
        Frame::Array(vec![])
    }

    /// Appends a bulk string to a `Frame::Array`.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not `Array`.
    pub fn push_bulk(&mut self, bytes: Bytes) {
        match self {
            Frame::Array(vec) => vec.push(Frame::Bulk(bytes)),
            _ => panic!("not an array frame"),
        }
    }

    /// Appends an integer to a `Frame::Array`.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not `Array`.
    pub fn push_int(&mut self, value: i64) {
        match self {
            Frame::Array(vec) => vec.push(Frame::Integer(value)),
            _ => panic!("not an array frame"),
        }
    }

    /// Encodes `self` onto `dst`, following the wire table in the reply codec spec.
    pub fn encode(&self, dst: &mut Vec<u8>) {
        match self {
            Frame::Simple(s) => {
                dst.push(b'+');
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(b"\r\n");
            }
            Frame::Error(e) => {
                dst.push(b'-');
                dst.extend_from_slice(e.as_bytes());
                dst.extend_from_slice(b"\r\n");
            }
            Frame::Integer(n) => {
                dst.push(b':');
                dst.extend_from_slice(n.to_string().as_bytes());
                dst.extend_from_slice(b"\r\n");
            }
            Frame::Bulk(b) => {
                dst.push(b'$');
                dst.extend_from_slice(b.len().to_string().as_bytes());
                dst.extend_from_slice(b"\r\n");
                dst.extend_from_slice(b);
                dst.extend_from_slice(b"\r\n");
            }
            Frame::Null => dst.extend_from_slice(b"$-1\r\n"),
            Frame::NullArray => dst.extend_from_slice(b"*-1\r\n"),
            Frame::Array(items) => {
                dst.push(b'*');
                dst.extend_from_slice(items.len().to_string().as_bytes());
                dst.extend_from_slice(b"\r\n");
                for item in items {
                    item.encode(dst);
                }
            }
        }
    }

    /// Checks whether a complete frame can be decoded from `src` without consuming it,
    /// returning the number of bytes it occupies. Used by the connection to know whether to
    /// block for more bytes before committing to `parse`.
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<(), Error> {
        match get_u8(src)? {
            b'+' | b'-' | b':' => {
                get_line(src)?;
                Ok(())
            }
            b'$' => {
                if peek_u8(src)? == b'-' {
                    // Null bulk: "$-1\r\n"
                    let line = get_line(src)?;
                    if line != b"-1" {
                        return Err(Error::Malformed("invalid null bulk length".into()));
                    }
                } else {
                    let len: i64 = atoi_line(get_line(src)?)?;
                    if len < 0 {
                        return Err(Error::Malformed("invalid bulk length".into()));
                    }
                    skip(src, len as usize + 2)?;
                }
                Ok(())
            }
            b'*' => {
                let len: i64 = atoi_line(get_line(src)?)?;
                if len <= 0 {
                    return Ok(());
                }
                for _ in 0..len {
                    Frame::check(src)?;
                }
                Ok(())
            }
            actual => Err(Error::Malformed(format!("unknown frame type byte `{actual}`"))),
        }
    }

    /// Parses a frame out of `src`, assuming [`Frame::check`] already confirmed a whole frame is
    /// present. Only the request-path subset is actually exercised by the server (arrays of
    /// bulks), but the full reply grammar is supported so the codec round-trips any reply it can
    /// produce.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Frame, Error> {
        match get_u8(src)? {
            b'+' => {
                let line = get_line(src)?.to_vec();
                let string = String::from_utf8(line).map_err(|_| Error::Malformed("invalid utf8".into()))?;
                Ok(Frame::Simple(string))
            }
            b'-' => {
                let line = get_line(src)?.to_vec();
                let string = String::from_utf8(line).map_err(|_| Error::Malformed("invalid utf8".into()))?;
                Ok(Frame::Error(string))
            }
            b':' => Ok(Frame::Integer(atoi_line(get_line(src)?)?)),
            b'$' => {
                if peek_u8(src)? == b'-' {
                    let line = get_line(src)?;
                    if line != b"-1" {
                        return Err(Error::Malformed("invalid null bulk length".into()));
                    }
                    return Ok(Frame::Null);
                }

                let len = atoi_line::<i64>(get_line(src)?)? as usize;
                let n = len + 2;
                if src.remaining() < n {
                    return Err(Error::Incomplete);
                }
                let data = Bytes::copy_from_slice(&src.chunk()[..len]);
                skip(src, n)?;
                Ok(Frame::Bulk(data))
            }
            b'*' => {
                let len = atoi_line::<i64>(get_line(src)?)?;
                if len <= 0 {
                    return Ok(Frame::Array(vec![]));
                }
                let mut out = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    out.push(Frame::parse(src)?);
                }
                Ok(Frame::Array(out))
            }
            actual => Err(Error::Malformed(format!("unknown frame type byte `{actual}`"))),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Frame::Simple(s) => s.fmt(f),
            Frame::Error(e) => write!(f, "error: {e}"),
            Frame::Integer(n) => n.fmt(f),
            Frame::Bulk(b) => write!(f, "{:?}", String::from_utf8_lossy(b)),
            Frame::Null | Frame::NullArray => "(nil)".fmt(f),
            Frame::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    item.fmt(f)?;
                }
                Ok(())
            }
        }
    }
}

/// Parse-time failure. `Incomplete` is the recoverable "need more bytes" signal; `Malformed`
/// marks a line that the stream parser drops before continuing, per the wire parser's tolerant
/// line-reading contract.
#[derive(Debug)]
pub enum Error {
    Incomplete,
    Malformed(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Incomplete => "stream ended early".fmt(f),
            Error::Malformed(s) => s.fmt(f),
        }
    }
}

fn peek_u8(src: &Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.chunk()[0])
}

fn get_u8(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

fn skip(src: &mut Cursor<&[u8]>, n: usize) -> Result<(), Error> {
    if src.remaining() < n {
        return Err(Error::Incomplete);
    }
    src.advance(n);
    Ok(())
}

/// Reads bytes up to (but not including) the next `\r\n`, requiring at least a 3-byte line
/// (marker + CR + LF at minimum) per the stream parser's line contract, and advances past it.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &[u8] = src.get_ref();
    let end = buf.len();

    let mut i = start;
    while i + 1 < end {
        if buf[i] == b'\r' && buf[i + 1] == b'\n' {
            src.set_position((i + 2) as u64);
            return Ok(&buf[start..i]);
        }
        i += 1;
    }
    Err(Error::Incomplete)
}

fn atoi_line<T: atoi::FromRadix10SignedChecked>(line: &[u8]) -> Result<T, Error> {
    atoi::atoi(line).ok_or_else(|| Error::Malformed("invalid integer".into()))
}
