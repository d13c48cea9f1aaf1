use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

#[derive(Debug)]
pub struct Sismember {
    key: Bytes,
    member: Bytes,
    valid: bool,
}

impl Sismember {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Sismember> {
        let key = parse.next_bytes()?;
        let member = parse.next_bytes()?;
        Ok(Sismember {
            key,
            member,
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
            reply: db.sismember(&self.key, &self.member),
            persist: Vec::new(),
        }
    }
}

impl Invalid for Sismember {
    fn new_invalid() -> Sismember {
        Sismember {
            key: Bytes::new(),
            member: Bytes::new(),
            valid: false,
        }
    }
}
