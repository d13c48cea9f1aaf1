use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

#[derive(Debug)]
pub struct Zrem {
    key: Bytes,
    members: Vec<Bytes>,
    valid: bool,
}

impl Zrem {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zrem> {
        let key = parse.next_bytes()?;
        let mut members = Vec::new();
        while let Ok(member) = parse.next_bytes() {
            members.push(member);
        }
        if members.is_empty() {
            return Ok(Zrem::new_invalid());
        }
        Ok(Zrem {
            key,
            members,
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
        db.zrem(&self.key, self.members)
    }
}

impl Invalid for Zrem {
    fn new_invalid() -> Zrem {
        Zrem {
            key: Bytes::new(),
            members: Vec::new(),
            valid: false,
        }
    }
}
