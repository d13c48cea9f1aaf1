use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

#[derive(Debug)]
pub struct Hget {
    key: Bytes,
    field: Bytes,
    valid: bool,
}

impl Hget {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hget> {
        let key = parse.next_bytes()?;
        let field = parse.next_bytes()?;
        Ok(Hget {
            key,
            field,
            valid: true,
        })
    }

    pub(crate) fn apply(self, db: &Db) -> CmdResult {
        if !self.valid {
            return CmdResult {
                reply: resp_invalid_arguments(),
                persist: Vec::new(),
            };
        }
        CmdResult {
            reply: db.hget(&self.key, &self.field),
            persist: Vec::new(),
        }
    }
}

impl Invalid for Hget {
    fn new_invalid() -> Hget {
        Hget {
            key: Bytes::new(),
            field: Bytes::new(),
            valid: false,
        }
    }
}
