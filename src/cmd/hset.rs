use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Sets the given field-value pairs in the hash at `key`, creating it if necessary. Replies
/// with the number of field-value pairs written, not the number of fields newly created.
#[derive(Debug, Default)]
pub struct Hset {
    key: Bytes,
    pairs: Vec<(Bytes, Bytes)>,
    valid: bool,
}

impl Hset {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hset> {
        let key = parse.next_bytes()?;
        let mut pairs = Vec::new();
        while let Ok(field) = parse.next_bytes() {
            let value = parse.next_bytes().map_err(|_| "protocol error")?;
            pairs.push((field, value));
        }
        if pairs.is_empty() {
            return Ok(Hset::new_invalid());
        }
        Ok(Hset {
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
        db.hset(self.key, self.pairs)
    }
}

impl Invalid for Hset {
    fn new_invalid() -> Hset {
        Hset {
            key: Bytes::new(),
            pairs: Vec::new(),
            valid: false,
        }
    }
}
