use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

#[derive(Debug)]
pub struct Hdel {
    key: Bytes,
    fields: Vec<Bytes>,
    valid: bool,
}

impl Hdel {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Hdel> {
        let key = parse.next_bytes()?;
        let mut fields = Vec::new();
        while let Ok(f) = parse.next_bytes() {
            fields.push(f);
        }
        if fields.is_empty() {
            return Ok(Hdel::new_invalid());
        }
        Ok(Hdel {
            key,
            fields,
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
        db.hdel(&self.key, self.fields)
    }
}

impl Invalid for Hdel {
    fn new_invalid() -> Hdel {
        Hdel {
            key: Bytes::new(),
            fields: Vec::new(),
            valid: false,
        }
    }
}
