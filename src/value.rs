//! The five typed containers a key can hold, plus the "rebuild command" view the persister's
//! rewrite phase uses to serialize the live dataset back into a minimal command log.

use crate::skiplist::SkipList;
use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};

/// A key is bound to exactly one of these at a time; switching variants requires deleting the
/// key first (attempting the wrong command on an existing key yields `WRONGTYPE`, see `Db`).
pub enum Value {
    Str(Bytes),
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
    Hash(HashMap<Bytes, Bytes>),
    SortedSet(SkipList<Bytes>),
}

impl Value {
    /// Name used in `TYPE`-style diagnostics and log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Hash(_) => "hash",
            Value::SortedSet(_) => "zset",
        }
    }

    /// The minimal RESP command (as a vector of byte-string arguments, command name first) that
    /// rebuilds this value under `key` when replayed into an empty store.
    pub fn rebuild_command(&self, key: &Bytes) -> Vec<Bytes> {
        match self {
            Value::Str(v) => vec![Bytes::from_static(b"SET"), key.clone(), v.clone()],
            Value::List(items) => {
                let mut cmd = Vec::with_capacity(2 + items.len());
                cmd.push(Bytes::from_static(b"RPUSH"));
                cmd.push(key.clone());
                cmd.extend(items.iter().cloned());
                cmd
            }
            Value::Set(members) => {
                let mut cmd = Vec::with_capacity(2 + members.len());
                cmd.push(Bytes::from_static(b"SADD"));
                cmd.push(key.clone());
                cmd.extend(members.iter().cloned());
                cmd
            }
            Value::Hash(fields) => {
                let mut cmd = Vec::with_capacity(2 + 2 * fields.len());
                cmd.push(Bytes::from_static(b"HSET"));
                cmd.push(key.clone());
                for (f, v) in fields {
                    cmd.push(f.clone());
                    cmd.push(v.clone());
                }
                cmd
            }
            Value::SortedSet(zset) => {
                let pairs = zset.iter_all();
                let mut cmd = Vec::with_capacity(2 + 2 * pairs.len());
                cmd.push(Bytes::from_static(b"ZADD"));
                cmd.push(key.clone());
                for (score, member) in pairs {
                    cmd.push(Bytes::from(score.to_string()));
                    cmd.push(member);
                }
                cmd
            }
        }
    }
}

/// Index-range read shared by `LRANGE`/`Value::List`. `stop == -1` means "last element". Returns
/// `None` for an out-of-range `start` or `start > stop` against a non-empty list (the caller maps
/// that to a null bulk reply); an empty list always yields `Some(vec![])`.
pub fn list_range(items: &VecDeque<Bytes>, start: i64, stop: i64) -> Option<Vec<Bytes>> {
    let len = items.len() as i64;
    if len == 0 {
        return Some(Vec::new());
    }
    let stop = if stop == -1 { len - 1 } else { stop };
    if start < 0 || start >= len || stop < start || stop >= len {
        return None;
    }
    Some(
        items
            .iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .cloned()
            .collect(),
    )
}

/// Pops `n` elements from the front (`front = true`) or back of `items`. Returns `None` if `n`
/// exceeds the list length (no partial pop), matching `LPOP`/`RPOP`'s all-or-nothing contract.
pub fn list_pop(items: &mut VecDeque<Bytes>, n: usize, front: bool) -> Option<Vec<Bytes>> {
    if n > items.len() {
        return None;
    }
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let item = if front {
            items.pop_front()
        } else {
            items.pop_back()
        };
        out.push(item.expect("length already checked"));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[test]
    fn range_negative_stop_means_last() {
        let items: VecDeque<Bytes> = ["a", "b", "c"].iter().map(|s| bytes(s)).collect();
        let got = list_range(&items, 0, -1).unwrap();
        assert_eq!(got, vec![bytes("a"), bytes("b"), bytes("c")]);
    }

    #[test]
    fn range_start_past_stop_is_invalid() {
        let items: VecDeque<Bytes> = ["a", "b"].iter().map(|s| bytes(s)).collect();
        assert!(list_range(&items, 1, 0).is_none());
    }

    #[test]
    fn range_on_empty_list_is_empty_not_invalid() {
        let items: VecDeque<Bytes> = VecDeque::new();
        assert_eq!(list_range(&items, 0, -1), Some(Vec::new()));
    }

    #[test]
    fn pop_more_than_len_returns_none() {
        let mut items: VecDeque<Bytes> = ["a"].iter().map(|s| bytes(s)).collect();
        assert!(list_pop(&mut items, 2, true).is_none());
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn pop_front_and_back() {
        let mut items: VecDeque<Bytes> = ["a", "b", "c"].iter().map(|s| bytes(s)).collect();
        assert_eq!(list_pop(&mut items, 2, true).unwrap(), vec![bytes("a"), bytes("b")]);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn rebuild_command_for_string() {
        let v = Value::Str(bytes("v"));
        assert_eq!(
            v.rebuild_command(&bytes("k")),
            vec![bytes("SET"), bytes("k"), bytes("v")]
        );
    }
}
