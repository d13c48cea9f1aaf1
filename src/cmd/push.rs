use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Shared implementation for `LPUSH`/`RPUSH`; which end is decided by the caller.
#[derive(Debug)]
pub struct Push {
    key: Bytes,
    items: Vec<Bytes>,
    valid: bool,
}

impl Push {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Push> {
        let key = parse.next_bytes()?;
        let mut items = Vec::new();
        while let Ok(item) = parse.next_bytes() {
            items.push(item);
        }
        if items.is_empty() {
            return Ok(Push::new_invalid());
        }
        Ok(Push {
            key,
            items,
            valid: true,
        })
    }

    pub(crate) fn apply(self, db: &mut Db, left: bool) -> CmdResult {
        if !self.valid {
            return CmdResult {
                reply: resp_invalid_arguments(),
                persist: Vec::new(),
            };
        }
        db.push(self.key, self.items, left)
    }
}

impl Invalid for Push {
    fn new_invalid() -> Push {
        Push {
            key: Bytes::new(),
            items: Vec::new(),
            valid: false,
        }
    }
}
