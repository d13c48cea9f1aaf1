//! Frame-oriented reads and writes over a TCP socket.
//!
//! Incoming bytes are buffered until [`Frame::check`] confirms a whole frame is present, then
//! [`Frame::parse`] decodes it. A malformed frame (bad length prefix, unknown type byte, ...)
//! doesn't kill the connection: the read loop can't know where the bad frame ends, so it
//! discards everything currently buffered and resynchronizes on the next bytes the client sends,
//! reporting the problem back to the caller so it can reply with an error frame first.

use crate::frame::{self, Frame};
use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
}

/// A frame-level read failure. `Malformed` is recoverable — the caller should report it to the
/// client and keep the connection open; anything else means the socket itself is gone.
pub enum ReadError {
    Io(crate::Error),
    Malformed(String),
}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> ReadError {
        ReadError::Io(err.into())
    }
}

impl Connection {
    pub fn new(socket: TcpStream) -> Connection {
        Connection {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Reads the next inbound frame, or `None` on a clean EOF with no partial data buffered.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ReadError> {
        loop {
            match self.parse_frame() {
                Ok(Some(frame)) => return Ok(Some(frame)),
                Ok(None) => {}
                Err(malformed) => return Err(malformed),
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(ReadError::Io("connection reset by peer".into()))
                };
            }
        }
    }

    fn parse_frame(&mut self) -> Result<Option<Frame>, ReadError> {
        let mut buf = Cursor::new(&self.buffer[..]);
        match Frame::check(&mut buf) {
            Ok(()) => {
                let len = buf.position() as usize;
                buf.set_position(0);
                let frame = Frame::parse(&mut buf).expect("check already validated this frame");
                self.buffer.advance(len);
                Ok(Some(frame))
            }
            Err(frame::Error::Incomplete) => Ok(None),
            Err(frame::Error::Malformed(msg)) => {
                self.buffer.clear();
                Err(ReadError::Malformed(msg))
            }
        }
    }

    /// Writes a single frame to the socket, flushing immediately.
    pub async fn write_frame(&mut self, frame: &Frame) -> crate::Result<()> {
        let mut dst = Vec::new();
        frame.encode(&mut dst);
        self.stream.write_all(&dst).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
