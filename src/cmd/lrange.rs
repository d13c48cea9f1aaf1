use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Returns the elements of the list at `key` between `start` and `stop`, inclusive. `stop == -1`
/// means the last element. An out-of-range (but non-empty-list) request is a null bulk, not an
/// error or empty array.
#[derive(Debug)]
pub struct Lrange {
    key: Bytes,
    start: i64,
    stop: i64,
    valid: bool,
}

impl Lrange {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Lrange> {
        let key = parse.next_bytes()?;
        let start = parse.next_int()?;
        let stop = parse.next_int()?;
        Ok(Lrange {
            key,
            start,
            stop,
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
            reply: db.lrange(&self.key, self.start, self.stop),
            persist: Vec::new(),
        }
    }
}

impl Invalid for Lrange {
    fn new_invalid() -> Lrange {
        Lrange {
            key: Bytes::new(),
            start: 0,
            stop: 0,
            valid: false,
        }
    }
}
