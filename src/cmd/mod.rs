mod get;
pub use get::Get;

mod set;
pub use set::Set;

mod mget;
pub use mget::Mget;

mod mset;
pub use mset::Mset;

mod push;
pub use push::Push;

mod pop;
pub use pop::Pop;

mod lrange;
pub use lrange::Lrange;

mod sadd;
pub use sadd::Sadd;

mod sismember;
pub use sismember::Sismember;

mod srem;
pub use srem::Srem;

mod hset;
pub use hset::Hset;

mod hget;
pub use hget::Hget;

mod hdel;
pub use hdel::Hdel;

mod zadd;
pub use zadd::Zadd;

mod zrangebyscore;
pub use zrangebyscore::Zrangebyscore;

mod zrem;
pub use zrem::Zrem;

mod expire;
pub use expire::{Expire, ExpireAt};

mod ping;
pub use ping::Ping;

mod unknown;
pub use unknown::Unknown;

use crate::db::CmdResult;
use crate::{Db, Frame, Parse};

/// Enumeration of every supported command.
#[derive(Debug)]
pub enum Command {
    Get(Get),
    Mget(Mget),
    Set(Set),
    Mset(Mset),
    Lpush(Push),
    Rpush(Push),
    Lpop(Pop),
    Rpop(Pop),
    Lrange(Lrange),
    Sadd(Sadd),
    Sismember(Sismember),
    Srem(Srem),
    Hset(Hset),
    Hget(Hget),
    Hdel(Hdel),
    Zadd(Zadd),
    Zrangebyscore(Zrangebyscore),
    Zrem(Zrem),
    Expire(Expire),
    ExpireAt(ExpireAt),
    Ping(Ping),
    Unknown(Unknown),
}

impl Command {
    /// Parses a command from a received frame, which must be the array variant.
    pub fn from_frame(frame: Frame) -> crate::Result<Command> {
        let mut parse = Parse::new(frame)?;
        let command_name = parse.next_string()?.to_lowercase();

        let command = match &command_name[..] {
            "get" => Command::Get(Get::parse_frames(&mut parse)?),
            "mget" => Command::Mget(transform_parse(Mget::parse_frames(&mut parse), &mut parse)),
            "set" => Command::Set(Set::parse_frames(&mut parse)?),
            "mset" => Command::Mset(transform_parse(Mset::parse_frames(&mut parse), &mut parse)),
            "lpush" => Command::Lpush(transform_parse(Push::parse_frames(&mut parse), &mut parse)),
            "rpush" => Command::Rpush(transform_parse(Push::parse_frames(&mut parse), &mut parse)),
            "lpop" => Command::Lpop(transform_parse(Pop::parse_frames(&mut parse), &mut parse)),
            "rpop" => Command::Rpop(transform_parse(Pop::parse_frames(&mut parse), &mut parse)),
            "lrange" => Command::Lrange(transform_parse(
                Lrange::parse_frames(&mut parse),
                &mut parse,
            )),
            "sadd" => Command::Sadd(transform_parse(Sadd::parse_frames(&mut parse), &mut parse)),
            "sismember" => Command::Sismember(transform_parse(
                Sismember::parse_frames(&mut parse),
                &mut parse,
            )),
            "srem" => Command::Srem(transform_parse(Srem::parse_frames(&mut parse), &mut parse)),
            "hset" => Command::Hset(transform_parse(Hset::parse_frames(&mut parse), &mut parse)),
            "hget" => Command::Hget(transform_parse(Hget::parse_frames(&mut parse), &mut parse)),
            "hdel" => Command::Hdel(transform_parse(Hdel::parse_frames(&mut parse), &mut parse)),
            "zadd" => Command::Zadd(transform_parse(Zadd::parse_frames(&mut parse), &mut parse)),
            "zrangebyscore" => Command::Zrangebyscore(transform_parse(
                Zrangebyscore::parse_frames(&mut parse),
                &mut parse,
            )),
            "zrem" => Command::Zrem(transform_parse(Zrem::parse_frames(&mut parse), &mut parse)),
            "expire" => Command::Expire(transform_parse(
                Expire::parse_frames(&mut parse),
                &mut parse,
            )),
            "expireat" => Command::ExpireAt(transform_parse(
                ExpireAt::parse_frames(&mut parse),
                &mut parse,
            )),
            "ping" => Command::Ping(Ping::parse_frames(&mut parse)?),

            _ => return Ok(Command::Unknown(Unknown::new(command_name))),
        };

        parse.finish()?;
        Ok(command)
    }

    /// The key(s) this command reads or writes, if any. Used to lazily expire a stale key right
    /// before the command that touches it runs, rather than waiting on the periodic GC sweep.
    fn touch_keys(&self) -> Vec<&bytes::Bytes> {
        use Command::*;

        match self {
            Get(c) => c.touch_keys(),
            Mget(c) => c.touch_keys(),
            Set(c) => c.touch_keys(),
            Mset(c) => c.touch_keys(),
            Lpush(c) | Rpush(c) => c.touch_keys(),
            Lpop(c) | Rpop(c) => c.touch_keys(),
            Lrange(c) => c.touch_keys(),
            Sadd(c) => c.touch_keys(),
            Sismember(c) => c.touch_keys(),
            Srem(c) => c.touch_keys(),
            Hset(c) => c.touch_keys(),
            Hget(c) => c.touch_keys(),
            Hdel(c) => c.touch_keys(),
            Zadd(c) => c.touch_keys(),
            Zrangebyscore(c) => c.touch_keys(),
            Zrem(c) => c.touch_keys(),
            Expire(c) => c.touch_keys(),
            ExpireAt(c) => c.touch_keys(),
            Ping(_) | Unknown(_) => Vec::new(),
        }
    }

    /// Applies the command to `db`, returning the reply and any persistence records to log.
    pub(crate) fn apply(self, db: &mut Db, now: i64) -> CmdResult {
        use Command::*;

        for key in self.touch_keys() {
            db.touch_expiry(key, now);
        }

        match self {
            Get(cmd) => cmd.apply(db),
            Mget(cmd) => cmd.apply(db),
            Set(cmd) => cmd.apply(db, now),
            Mset(cmd) => cmd.apply(db),
            Lpush(cmd) => cmd.apply(db, true),
            Rpush(cmd) => cmd.apply(db, false),
            Lpop(cmd) => cmd.apply(db, true),
            Rpop(cmd) => cmd.apply(db, false),
            Lrange(cmd) => cmd.apply(db),
            Sadd(cmd) => cmd.apply(db),
            Sismember(cmd) => cmd.apply(db),
            Srem(cmd) => cmd.apply(db),
            Hset(cmd) => cmd.apply(db),
            Hget(cmd) => cmd.apply(db),
            Hdel(cmd) => cmd.apply(db),
            Zadd(cmd) => cmd.apply(db),
            Zrangebyscore(cmd) => cmd.apply(db),
            Zrem(cmd) => cmd.apply(db),
            Expire(cmd) => cmd.apply(db, now),
            ExpireAt(cmd) => cmd.apply(db, now),
            Ping(cmd) => cmd.apply(),
            Unknown(cmd) => cmd.apply(),
        }
    }

    /// Returns the command name, for logging.
    pub(crate) fn get_name(&self) -> &str {
        match self {
            Command::Get(_) => "get",
            Command::Mget(_) => "mget",
            Command::Set(_) => "set",
            Command::Mset(_) => "mset",
            Command::Lpush(_) => "lpush",
            Command::Rpush(_) => "rpush",
            Command::Lpop(_) => "lpop",
            Command::Rpop(_) => "rpop",
            Command::Lrange(_) => "lrange",
            Command::Sadd(_) => "sadd",
            Command::Sismember(_) => "sismember",
            Command::Srem(_) => "srem",
            Command::Hset(_) => "hset",
            Command::Hget(_) => "hget",
            Command::Hdel(_) => "hdel",
            Command::Zadd(_) => "zadd",
            Command::Zrangebyscore(_) => "zrangebyscore",
            Command::Zrem(_) => "zrem",
            Command::Expire(_) => "expire",
            Command::ExpireAt(_) => "expireat",
            Command::Ping(_) => "ping",
            Command::Unknown(cmd) => cmd.get_name(),
        }
    }
}

/// Commands implement this so a malformed frame degrades to an `invalid-arguments` reply
/// instead of tearing down the connection.
pub trait Invalid {
    fn new_invalid() -> Self;
}

fn transform_parse<T: Invalid>(parse_res: crate::Result<T>, parse: &mut Parse) -> T {
    match parse_res {
        Ok(cmd) => {
            if parse.check_finish() {
                cmd
            } else {
                T::new_invalid()
            }
        }
        Err(_) => T::new_invalid(),
    }
}
