use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Get the value of key.
///
/// If the key does not exist the special value nil is returned. An error is
/// returned if the value stored at key is not a string.
#[derive(Debug)]
pub struct Get {
    key: Bytes,
    valid: bool,
}

impl Get {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Get> {
        let key = parse.next_bytes()?;
        Ok(Get { key, valid: true })
    }

    pub(crate) fn apply(self, db: &Db) -> CmdResult {
        if !self.valid {
            return CmdResult {
                reply: resp_invalid_arguments(),
                persist: Vec::new(),
            };
        }
        CmdResult {
            reply: db.get(&self.key),
            persist: Vec::new(),
        }
    }
}

impl Invalid for Get {
    fn new_invalid() -> Get {
        Get {
            key: Bytes::new(),
            valid: false,
        }
    }
}
