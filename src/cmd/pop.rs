use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Shared implementation for `LPOP`/`RPOP`. `n` defaults to 1 when omitted; popping more
/// elements than the list holds returns a null bulk without mutating anything.
#[derive(Debug)]
pub struct Pop {
    key: Bytes,
    n: i64,
    valid: bool,
}

impl Pop {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Pop> {
        let key = parse.next_bytes()?;
        let n = parse.next_int().unwrap_or(1);
        Ok(Pop { key, n, valid: true })
    }

    pub(crate) fn apply(self, db: &mut Db, left: bool) -> CmdResult {
        if !self.valid {
            return CmdResult {
                reply: resp_invalid_arguments(),
                persist: Vec::new(),
            };
        }
        db.pop(&self.key, self.n, left)
    }
}

impl Invalid for Pop {
    fn new_invalid() -> Pop {
        Pop {
            key: Bytes::new(),
            n: 0,
            valid: false,
        }
    }
}
