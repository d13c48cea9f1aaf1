//! The single logical database: owns the key space, the expiry index, and one method per
//! supported command. Not thread-safe by design — the executor is the only caller, and it calls
//! in, never concurrently (see `crate::executor`).

use crate::skiplist::SkipList;
use crate::utils::{format_local_time, parse_local_time};
use crate::value::{list_pop, list_range, Value};
use crate::Frame;
use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";
const ERR_SYNTAX: &str = "ERR syntax error";
const ERR_INVALID_EXPIRE: &str = "ERR invalid expire time";

fn wrongtype() -> Frame {
    Frame::Error(WRONGTYPE.into())
}

/// One command's outcome: the reply to send back, plus zero or more canonical log records for
/// the persister. A record is itself an array of byte-string arguments, command name first.
pub struct CmdResult {
    pub reply: Frame,
    pub persist: Vec<Vec<Bytes>>,
}

impl CmdResult {
    fn reply_only(reply: Frame) -> Self {
        CmdResult {
            reply,
            persist: Vec::new(),
        }
    }

    fn mutated(reply: Frame, record: Vec<Bytes>) -> Self {
        CmdResult {
            reply,
            persist: vec![record],
        }
    }
}

fn rec<I: IntoIterator<Item = Bytes>>(name: &'static str, parts: I) -> Vec<Bytes> {
    let mut v = vec![Bytes::from_static(name.as_bytes())];
    v.extend(parts);
    v
}

pub struct Db {
    data: HashMap<Bytes, Value>,
    expired_at: HashMap<Bytes, i64>,
    expiry_index: SkipList<Bytes>,
}

impl Db {
    pub fn new() -> Db {
        Db {
            data: HashMap::new(),
            expired_at: HashMap::new(),
            expiry_index: SkipList::new(),
        }
    }

    /// Lazily expires `key` if its TTL has passed. Called by the executor on a command's
    /// first-argument key before dispatch, per the lazy-expiration contract.
    pub fn touch_expiry(&mut self, key: &Bytes, now: i64) -> bool {
        match self.expired_at.get(key) {
            Some(&at) if at <= now => {
                self.purge(key);
                true
            }
            _ => false,
        }
    }

    /// Periodic GC sweep: removes every key whose expiry has passed. Returns the count reaped.
    pub fn sweep_expired(&mut self, now: i64) -> usize {
        let expired = self.expiry_index.range(i64::MIN, now);
        for key in &expired {
            self.purge(key);
        }
        expired.len()
    }

    fn purge(&mut self, key: &Bytes) {
        self.data.remove(key);
        if self.expired_at.remove(key).is_some() {
            self.expiry_index.remove(key);
        }
    }

    /// Iterates every live (non-expired) key for the rewrite pipeline's phase 2. Read-only: does
    /// not perform lazy expiration itself.
    pub fn for_each_live(&self, now: i64, mut f: impl FnMut(&Bytes, &Value, Option<i64>)) {
        for (key, value) in &self.data {
            if let Some(&at) = self.expired_at.get(key) {
                if at <= now {
                    continue;
                }
                f(key, value, Some(at));
            } else {
                f(key, value, None);
            }
        }
    }

    fn clear_expiry(&mut self, key: &Bytes) {
        if self.expired_at.remove(key).is_some() {
            self.expiry_index.remove(key);
        }
    }

    /// Sets `key`'s expiry to the absolute Unix second `at`. No-op if the key doesn't exist
    /// (matches the reference implementation's silent skip). Returns whether it applied.
    fn apply_expire_at(&mut self, key: &Bytes, at: i64) -> bool {
        if !self.data.contains_key(key) {
            return false;
        }
        self.clear_expiry(key);
        self.expired_at.insert(key.clone(), at);
        self.expiry_index.add(at, key.clone());
        true
    }

    // ---- expiration commands ----

    pub fn expire(&mut self, key: Bytes, seconds: i64, now: i64) -> CmdResult {
        if seconds <= 0 {
            return CmdResult::reply_only(Frame::Error(ERR_INVALID_EXPIRE.into()));
        }
        let at = now + seconds;
        if self.apply_expire_at(&key, at) {
            let record = rec(
                "EXPIREAT",
                [key, Bytes::from(format_local_time(at))],
            );
            CmdResult::mutated(Frame::Simple("OK".into()), record)
        } else {
            CmdResult::reply_only(Frame::Simple("OK".into()))
        }
    }

    pub fn expire_at(&mut self, key: Bytes, at_str: String, now: i64) -> CmdResult {
        let Some(at) = parse_local_time(&at_str) else {
            return CmdResult::reply_only(Frame::Error(ERR_INVALID_EXPIRE.into()));
        };
        if at <= now {
            return CmdResult::reply_only(Frame::Error(ERR_INVALID_EXPIRE.into()));
        }
        if self.apply_expire_at(&key, at) {
            let record = rec("EXPIREAT", [key, Bytes::from(at_str)]);
            CmdResult::mutated(Frame::Simple("OK".into()), record)
        } else {
            CmdResult::reply_only(Frame::Simple("OK".into()))
        }
    }

    // ---- string commands ----

    pub fn get(&self, key: &Bytes) -> Frame {
        match self.data.get(key) {
            None => Frame::Null,
            Some(Value::Str(v)) => Frame::Bulk(v.clone()),
            Some(_) => wrongtype(),
        }
    }

    /// Missing keys are encoded as the literal three-byte bulk `(nil)` rather than a null bulk,
    /// matching the reference server's `MGET` quirk (see the spec's noted probable-bug list).
    pub fn mget(&self, keys: &[Bytes]) -> Frame {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let item = match self.data.get(key) {
                Some(Value::Str(v)) => Frame::Bulk(v.clone()),
                _ => Frame::Bulk(Bytes::from_static(b"(nil)")),
            };
            out.push(item);
        }
        Frame::Array(out)
    }

    pub fn set(&mut self, key: Bytes, value: Bytes, nx: bool, ex: Option<i64>, now: i64) -> CmdResult {
        if nx && self.data.contains_key(&key) {
            return CmdResult::reply_only(Frame::Null);
        }
        if let Some(secs) = ex {
            if secs <= 0 {
                return CmdResult::reply_only(Frame::Error(ERR_INVALID_EXPIRE.into()));
            }
        }

        self.clear_expiry(&key);
        self.data.insert(key.clone(), Value::Str(value.clone()));

        let mut persist = vec![rec("SET", [key.clone(), value])];
        if let Some(secs) = ex {
            let at = now + secs;
            self.expired_at.insert(key.clone(), at);
            self.expiry_index.add(at, key.clone());
            persist.push(rec("EXPIREAT", [key, Bytes::from(format_local_time(at))]));
        }

        CmdResult {
            reply: Frame::Integer(1),
            persist,
        }
    }

    pub fn mset(&mut self, pairs: Vec<(Bytes, Bytes)>) -> CmdResult {
        let count = pairs.len() as i64;
        let mut record = vec![Bytes::from_static(b"MSET")];
        for (k, v) in pairs {
            self.clear_expiry(&k);
            record.push(k.clone());
            record.push(v.clone());
            self.data.insert(k, Value::Str(v));
        }
        CmdResult::mutated(Frame::Integer(count), record)
    }

    // ---- list commands ----

    pub fn push(&mut self, key: Bytes, values: Vec<Bytes>, left: bool) -> CmdResult {
        let entry = self
            .data
            .entry(key.clone())
            .or_insert_with(|| Value::List(VecDeque::new()));
        let Value::List(list) = entry else {
            return CmdResult::reply_only(wrongtype());
        };
        for v in &values {
            if left {
                list.push_front(v.clone());
            } else {
                list.push_back(v.clone());
            }
        }
        let len = list.len() as i64;
        let name = if left { "LPUSH" } else { "RPUSH" };
        let mut parts = vec![key];
        parts.extend(values);
        CmdResult::mutated(Frame::Integer(len), rec(name, parts))
    }

    pub fn pop(&mut self, key: &Bytes, n: i64, left: bool) -> CmdResult {
        if n < 1 {
            return CmdResult::reply_only(Frame::Error(ERR_SYNTAX.into()));
        }
        let Some(value) = self.data.get_mut(key) else {
            return CmdResult::reply_only(Frame::Null);
        };
        let Value::List(list) = value else {
            return CmdResult::reply_only(wrongtype());
        };
        let Some(popped) = list_pop(list, n as usize, left) else {
            return CmdResult::reply_only(Frame::Null);
        };

        let reply = if popped.len() == 1 {
            Frame::Bulk(popped[0].clone())
        } else {
            Frame::Array(popped.into_iter().map(Frame::Bulk).collect())
        };
        let name = if left { "LPOP" } else { "RPOP" };
        let record = rec(name, [key.clone(), Bytes::from(n.to_string())]);
        CmdResult::mutated(reply, record)
    }

    pub fn lrange(&self, key: &Bytes, start: i64, stop: i64) -> Frame {
        match self.data.get(key) {
            None => Frame::Array(Vec::new()),
            Some(Value::List(list)) => match list_range(list, start, stop) {
                Some(items) => Frame::Array(items.into_iter().map(Frame::Bulk).collect()),
                None => Frame::Null,
            },
            Some(_) => wrongtype(),
        }
    }

    // ---- set commands ----

    pub fn sadd(&mut self, key: Bytes, members: Vec<Bytes>) -> CmdResult {
        let entry = self
            .data
            .entry(key.clone())
            .or_insert_with(|| Value::Set(HashSet::new()));
        let Value::Set(set) = entry else {
            return CmdResult::reply_only(wrongtype());
        };
        let mut added = 0i64;
        for m in &members {
            if set.insert(m.clone()) {
                added += 1;
            }
        }
        let mut parts = vec![key];
        parts.extend(members);
        CmdResult::mutated(Frame::Integer(added), rec("SADD", parts))
    }

    pub fn sismember(&self, key: &Bytes, member: &Bytes) -> Frame {
        match self.data.get(key) {
            None => Frame::Integer(0),
            Some(Value::Set(set)) => Frame::Integer(set.contains(member) as i64),
            Some(_) => wrongtype(),
        }
    }

    pub fn srem(&mut self, key: &Bytes, members: Vec<Bytes>) -> CmdResult {
        let Some(value) = self.data.get_mut(key) else {
            return CmdResult::reply_only(Frame::Integer(0));
        };
        let Value::Set(set) = value else {
            return CmdResult::reply_only(wrongtype());
        };
        let mut removed = 0i64;
        for m in &members {
            if set.remove(m) {
                removed += 1;
            }
        }
        let mut parts = vec![key.clone()];
        parts.extend(members);
        CmdResult::mutated(Frame::Integer(removed), rec("SREM", parts))
    }

    // ---- hash commands ----

    pub fn hset(&mut self, key: Bytes, pairs: Vec<(Bytes, Bytes)>) -> CmdResult {
        let entry = self
            .data
            .entry(key.clone())
            .or_insert_with(|| Value::Hash(HashMap::new()));
        let Value::Hash(hash) = entry else {
            return CmdResult::reply_only(wrongtype());
        };
        let written = pairs.len() as i64;
        let mut parts = vec![key];
        for (f, v) in pairs {
            parts.push(f.clone());
            parts.push(v.clone());
            hash.insert(f, v);
        }
        CmdResult::mutated(Frame::Integer(written), rec("HSET", parts))
    }

    pub fn hget(&self, key: &Bytes, field: &Bytes) -> Frame {
        match self.data.get(key) {
            None => Frame::Null,
            Some(Value::Hash(hash)) => match hash.get(field) {
                Some(v) => Frame::Bulk(v.clone()),
                None => Frame::Null,
            },
            Some(_) => wrongtype(),
        }
    }

    pub fn hdel(&mut self, key: &Bytes, fields: Vec<Bytes>) -> CmdResult {
        let Some(value) = self.data.get_mut(key) else {
            return CmdResult::reply_only(Frame::Integer(0));
        };
        let Value::Hash(hash) = value else {
            return CmdResult::reply_only(wrongtype());
        };
        let mut removed = 0i64;
        for f in &fields {
            if hash.remove(f).is_some() {
                removed += 1;
            }
        }
        let mut parts = vec![key.clone()];
        parts.extend(fields);
        CmdResult::mutated(Frame::Integer(removed), rec("HDEL", parts))
    }

    // ---- sorted set commands ----

    pub fn zadd(&mut self, key: Bytes, pairs: Vec<(i64, Bytes)>) -> CmdResult {
        let entry = self
            .data
            .entry(key.clone())
            .or_insert_with(|| Value::SortedSet(SkipList::new()));
        let Value::SortedSet(zset) = entry else {
            return CmdResult::reply_only(wrongtype());
        };
        let submitted = pairs.len() as i64;
        let mut parts = vec![key];
        for (score, member) in pairs {
            parts.push(Bytes::from(score.to_string()));
            parts.push(member.clone());
            zset.add(score, member);
        }
        CmdResult::mutated(Frame::Integer(submitted), rec("ZADD", parts))
    }

    pub fn zrangebyscore(&self, key: &Bytes, lo: i64, hi: i64) -> Frame {
        match self.data.get(key) {
            None => Frame::NullArray,
            Some(Value::SortedSet(zset)) => {
                let members = zset.range(lo, hi);
                if members.is_empty() {
                    Frame::NullArray
                } else {
                    Frame::Array(members.into_iter().map(Frame::Bulk).collect())
                }
            }
            Some(_) => wrongtype(),
        }
    }

    pub fn zrem(&mut self, key: &Bytes, members: Vec<Bytes>) -> CmdResult {
        let Some(value) = self.data.get_mut(key) else {
            return CmdResult::reply_only(Frame::Integer(0));
        };
        let Value::SortedSet(zset) = value else {
            return CmdResult::reply_only(wrongtype());
        };
        let mut removed = 0i64;
        for m in &members {
            removed += zset.remove(m);
        }
        let mut parts = vec![key.clone()];
        parts.extend(members);
        CmdResult::mutated(Frame::Integer(removed), rec("ZREM", parts))
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[test]
    fn set_then_get() {
        let mut db = Db::new();
        db.set(b("k"), b("v"), false, None, 0);
        assert!(matches!(db.get(&b("k")), Frame::Bulk(v) if v == b("v")));
    }

    #[test]
    fn set_idempotent() {
        let mut db = Db::new();
        db.set(b("k"), b("v"), false, None, 0);
        db.set(b("k"), b("v"), false, None, 0);
        assert!(matches!(db.get(&b("k")), Frame::Bulk(v) if v == b("v")));
    }

    #[test]
    fn wrongtype_leaves_state_unchanged() {
        let mut db = Db::new();
        db.set(b("k"), b("v"), false, None, 0);
        let result = db.push(b("k"), vec![b("x")], true);
        assert!(matches!(result.reply, Frame::Error(_)));
        assert!(matches!(db.get(&b("k")), Frame::Bulk(v) if v == b("v")));
    }

    #[test]
    fn set_nx_blocks_on_existing_key() {
        let mut db = Db::new();
        db.set(b("k"), b("v"), false, None, 0);
        let result = db.set(b("k"), b("v2"), true, None, 0);
        assert!(matches!(result.reply, Frame::Null));
        assert!(result.persist.is_empty());
    }

    #[test]
    fn lazy_expiry_removes_all_traces() {
        let mut db = Db::new();
        db.set(b("k"), b("v"), false, None, 0);
        db.expire(b("k"), 10, 0);
        assert!(db.touch_expiry(&b("k"), 20));
        assert!(matches!(db.get(&b("k")), Frame::Null));
        assert_eq!(db.sweep_expired(100), 0);
    }

    #[test]
    fn gc_sweep_reaps_expired_keys() {
        let mut db = Db::new();
        db.set(b("k"), b("v"), false, None, 0);
        db.expire(b("k"), 5, 0);
        assert_eq!(db.sweep_expired(100), 1);
        assert!(matches!(db.get(&b("k")), Frame::Null));
    }

    #[test]
    fn mget_missing_key_is_literal_nil_bulk() {
        let db = Db::new();
        let reply = db.mget(&[b("missing")]);
        match reply {
            Frame::Array(items) => {
                assert_eq!(items.len(), 1);
                assert!(matches!(&items[0], Frame::Bulk(v) if v == &b("(nil)")));
            }
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn zrangebyscore_open_upper_bound() {
        let mut db = Db::new();
        db.zadd(b("z"), vec![(10, b("a")), (5, b("b")), (15, b("c"))]);
        let reply = db.zrangebyscore(&b("z"), 0, -1);
        match reply {
            Frame::Array(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn lpop_more_than_length_is_null_and_not_persisted() {
        let mut db = Db::new();
        db.push(b("l"), vec![b("a")], false);
        let result = db.pop(&b("l"), 5, true);
        assert!(matches!(result.reply, Frame::Null));
        assert!(result.persist.is_empty());
    }

    #[test]
    fn empty_collection_key_survives_until_deleted() {
        let mut db = Db::new();
        db.push(b("l"), vec![b("a")], true);
        db.pop(&b("l"), 1, true);
        // The list is now empty but the key itself is still present (not auto-removed).
        assert!(matches!(db.lrange(&b("l"), 0, -1), Frame::Array(v) if v.is_empty()));
    }
}
