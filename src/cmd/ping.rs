use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::parse::ParseError;
use crate::{Frame, Parse};
use bytes::Bytes;

/// Liveness probe. With no argument, replies `PONG`; with one, echoes it back as a bulk string.
#[derive(Debug)]
pub struct Ping {
    msg: Option<Bytes>,
}

impl Ping {
    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Ping> {
        match parse.next_bytes() {
            Ok(msg) => Ok(Ping { msg: Some(msg) }),
            Err(ParseError::EndOfStream) => Ok(Ping { msg: None }),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) fn apply(self) -> CmdResult {
        let reply = match self.msg {
            Some(msg) => Frame::Bulk(msg),
            None => Frame::Simple("PONG".to_string()),
        };
        CmdResult {
            reply,
            persist: Vec::new(),
        }
    }
}

impl Invalid for Ping {
    fn new_invalid() -> Ping {
        Ping { msg: None }
    }
}
