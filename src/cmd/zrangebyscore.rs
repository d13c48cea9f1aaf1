use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

fn parse_bound(raw: &[u8], plus_inf: i64) -> Option<i64> {
    match raw {
        b"-inf" => Some(i64::MIN),
        b"+inf" => Some(plus_inf),
        _ => atoi::atoi(raw),
    }
}

/// Returns the members of the sorted set at `key` with score between `min` and `max`,
/// inclusive. `-inf`/`+inf` are accepted in place of a literal bound.
#[derive(Debug)]
pub struct Zrangebyscore {
    key: Bytes,
    min: i64,
    max: i64,
    valid: bool,
}

impl Zrangebyscore {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Zrangebyscore> {
        let key = parse.next_bytes()?;
        let min_raw = parse.next_bytes()?;
        let max_raw = parse.next_bytes()?;

        // -1 is the sentinel `SkipList::range` treats as +infinity.
        let Some(min) = parse_bound(&min_raw, -1) else {
            return Ok(Zrangebyscore::new_invalid());
        };
        let Some(max) = parse_bound(&max_raw, -1) else {
            return Ok(Zrangebyscore::new_invalid());
        };

        Ok(Zrangebyscore {
            key,
            min,
            max,
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
            reply: db.zrangebyscore(&self.key, self.min, self.max),
            persist: Vec::new(),
        }
    }
}

impl Invalid for Zrangebyscore {
    fn new_invalid() -> Zrangebyscore {
        Zrangebyscore {
            key: Bytes::new(),
            min: 0,
            max: 0,
            valid: false,
        }
    }
}
