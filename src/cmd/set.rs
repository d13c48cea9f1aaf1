use crate::cmd::Invalid;
use crate::db::CmdResult;
use crate::parse::ParseError;
use crate::utils::resp_invalid_arguments;
use crate::{Db, Parse};
use bytes::Bytes;

/// Set `key` to hold the string `value`.
///
/// If `key` already holds a value, it is overwritten, regardless of its type.
/// Any previous time to live associated with the key is discarded on
/// successful `SET`.
///
/// # Options
///
/// * `EX seconds` -- set the specified expire time, in seconds.
/// * `NX` -- only set the key if it does not already exist.
#[derive(Debug)]
pub struct Set {
    key: Bytes,
    value: Bytes,
    ex: Option<i64>,
    nx: bool,
    valid: bool,
}

impl Set {
    pub(crate) fn touch_keys(&self) -> Vec<&Bytes> {
        vec![&self.key]
    }

    pub(crate) fn parse_frames(parse: &mut Parse) -> crate::Result<Set> {
        use ParseError::EndOfStream;

        let key = parse.next_bytes()?;
        let value = parse.next_bytes()?;

        let mut ex = None;
        let mut nx = false;

        loop {
            match parse.next_string() {
                Ok(s) if s.to_uppercase() == "EX" => {
                    if ex.is_some() {
                        return Err("syntax error".into());
                    }
                    ex = Some(parse.next_int()?);
                }
                Ok(s) if s.to_uppercase() == "NX" => {
                    if nx {
                        return Err("syntax error".into());
                    }
                    nx = true;
                }
                Ok(_) => return Err("syntax error".into()),
                Err(EndOfStream) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Set {
            key,
            value,
            ex,
            nx,
            valid: true,
        })
    }

    pub(crate) fn apply(self, db: &mut Db, now: i64) -> CmdResult {
        if !self.valid {
            return CmdResult {
                reply: resp_invalid_arguments(),
                persist: Vec::new(),
            };
        }
        db.set(self.key, self.value, self.nx, self.ex, now)
    }
}

impl Invalid for Set {
    fn new_invalid() -> Set {
        Set {
            key: Bytes::new(),
            value: Bytes::new(),
            ex: None,
            nx: false,
            valid: false,
        }
    }
}
