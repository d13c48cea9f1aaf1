use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Sets the given keys to their respective values, as one atomic operation.
#[derive(Debug, Default)]
pub struct Mset {
    pairs: Vec<(Bytes, Bytes)>,
    valid: bool,
}

impl Mset {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        self.pairs.iter().map(|(k, _)| k).collect()
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Mset> {
        let mut pairs = Vec::new();
        while let Ok(key) = parse.next_bytes() {
            let value = parse.next_bytes().map_err(|_| "protocol error")?;
            pairs.push((key, value));
        }
        Ok(Mset { pairs, valid: true })
    }

    pub(crate) fn apply(self, db: &mut Db) -> CmdResult {
        if !self.valid || self.pairs.is_empty() {
            return CmdResult {
                reply: resp_invalid_arguments(),
                persist: Vec::new(),
            };
        }
        db.mset(self.pairs)
    }
}

impl Invalid for Mset {
    fn new_invalid() -> Mset {
        Mset {
            pairs: Vec::new(),
            valid: false,
        }
    }
}
