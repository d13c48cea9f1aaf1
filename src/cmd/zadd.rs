use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Adds the given score-member pairs to the sorted set at `key`, creating it if necessary.
/// Scores are plain integers, not the floats full Redis uses.
#[derive(Debug)]
pub struct Zadd {
    key: Bytes,
    pairs: Vec<(i64, Bytes)>,
    valid: bool,
}

impl Zadd {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zadd> {
        let key = parse.next_bytes()?;
        let mut pairs = Vec::new();
        loop {
            let score = match parse.next_int() {
                Ok(s) => s,
                Err(crate::parse::ParseError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            };
            let member = parse.next_bytes().map_err(|_| "protocol error")?;
            pairs.push((score, member));
        }
        if pairs.is_empty() {
            return Ok(Zadd::new_invalid());
        }
        Ok(Zadd {
            key,
            pairs,
            valid: true,
        })
    }

    pub(crate) fn apply(self, db: &mut Db) -> CmdResult {
        if !self.valid {
            return CmdResult {
                reply: resp_invalid_arguments(),
                persist: Vec::new(),
            };
        }
        db.zadd(self.key, self.pairs)
    }
}

impl Invalid for Zadd {
    fn new_invalid() -> Zadd {
        Zadd {
            key: Bytes::new(),
            pairs: Vec::new(),
            valid: false,
        }
    }
}
