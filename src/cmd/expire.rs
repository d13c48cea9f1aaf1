use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Sets a TTL, in seconds from now, on `key`. A no-op (still replying `OK`) if `key` doesn't
/// exist; `ERR invalid expire time` if `seconds` isn't a positive integer.
#[derive(Debug)]
pub struct Expire {
    key: Bytes,
    seconds: i64,
    valid: bool,
}

impl Expire {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Expire> {
        let key = parse.next_bytes()?;
        let seconds = parse.next_int()?;
        Ok(Expire {
            key,
            seconds,
            valid: true,
        })
    }

    pub(crate) fn apply(self, db: &mut Db, now: i64) -> CmdResult {
        if !self.valid {
            return CmdResult {
                reply: resp_invalid_arguments(),
                persist: Vec::new(),
            };
        }
        db.expire(self.key, self.seconds, now)
    }
}

impl Invalid for Expire {
    fn new_invalid() -> Expire {
        Expire {
            key: Bytes::new(),
            seconds: 0,
            valid: false,
        }
    }
}

/// Sets an absolute expiry time on `key`, given as local time `yyyy-MM-dd HH:mm:ss`.
#[derive(Debug)]
pub struct ExpireAt {
    key: Bytes,
    at: String,
    valid: bool,
}

impl ExpireAt {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<ExpireAt> {
        let key = parse.next_bytes()?;
        let at = parse.next_string()?;
        Ok(ExpireAt {
            key,
            at,
            valid: true,
        })
    }

    pub(crate) fn apply(self, db: &mut Db, now: i64) -> CmdResult {
        if !self.valid {
            return CmdResult {
                reply: resp_invalid_arguments(),
                persist: Vec::new(),
            };
        }
        db.expire_at(self.key, self.at, now)
    }
}

impl Invalid for ExpireAt {
    fn new_invalid() -> ExpireAt {
        ExpireAt {
            key: Bytes::new(),
            at: String::new(),
            valid: false,
        }
    }
}
