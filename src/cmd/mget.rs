use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Returns the values of all specified keys. A missing key is reported as the
/// literal bulk string `(nil)` rather than a null bulk.
#[derive(Debug, Default)]
pub struct Mget {
    keys: Vec<Bytes>,
    valid: bool,
}

impl Mget {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        self.keys.iter().collect()
    }

    pub(crate) fn add_key(&mut self, key: Bytes) {
        self.keys.push(key);
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Mget> {
        let mut mget = Mget {
            keys: Vec::new(),
            valid: true,
        };
        while let Ok(key) = parse.next_bytes() {
            mget.add_key(key);
        }
        Ok(mget)
    }

    pub(crate) fn apply(self, db: &Db) -> CmdResult {
        if !self.valid || self.keys.is_empty() {
            return CmdResult {
                reply: resp_invalid_arguments(),
                persist: Vec::new(),
            };
        }
        CmdResult {
            reply: db.mget(&self.keys),
            persist: Vec::new(),
        }
    }
}

impl Invalid for Mget {
    fn new_invalid() -> Mget {
        Mget {
            keys: Vec::new(),
            valid: false,
        }
    }
}
