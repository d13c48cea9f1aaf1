use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Adds the given members to the set at `key`, creating it if necessary.
#[derive(Debug)]
pub struct Sadd {
    key: Bytes,
    members: Vec<Bytes>,
    valid: bool,
}

impl Sadd {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Sadd> {
        let key = parse.next_bytes()?;
        let mut members = Vec::new();
        while let Ok(member) = parse.next_bytes() {
            members.push(member);
        }
        if members.is_empty() {
            return Ok(Sadd::new_invalid());
        }
        Ok(Sadd {
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
        db.sadd(self.key, self.members)
    }
}

impl Invalid for Sadd {
    fn new_invalid() -> Sadd {
        Sadd {
            key: Bytes::new(),
            members: Vec::new(),
            valid: false,
        }
    }
}
