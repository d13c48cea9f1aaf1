//! A probabilistic ordered multimap from `i64` score to a set of members.
//!
//! Used both as the backing store for sorted-set values (`score` = the member's rank, `member` =
//! the sorted-set member) and, instantiated a second time, as the expiry index (`score` = a
//! Unix-second expiry, `member` = the expiring key). Member order within a score is unspecified —
//! members sharing a score live in a `HashSet`, not a `Vec`.

use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

struct Node<M> {
    score: i64,
    members: HashSet<M>,
    next: Vec<Option<usize>>,
}

/// Skiplist nodes live in a flat `Vec` (an arena) indexed by `usize`; `next` pointers are indices
/// into that arena rather than raw pointers, which keeps the structure entirely safe-Rust.
pub struct SkipList<M> {
    nodes: Vec<Node<M>>,
    head: Vec<Option<usize>>,
    score_to_node: HashMap<i64, usize>,
    member_to_score: HashMap<M, i64>,
}

impl<M: Eq + Hash + Clone> SkipList<M> {
    pub fn new() -> Self {
        SkipList {
            nodes: Vec::new(),
            head: Vec::new(),
            score_to_node: HashMap::new(),
            member_to_score: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.member_to_score.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_to_score.is_empty()
    }

    pub fn score_of(&self, member: &M) -> Option<i64> {
        self.member_to_score.get(member).copied()
    }

    /// Inserts `member` at `score`, moving it from any prior score it held.
    pub fn add(&mut self, score: i64, member: M) {
        if let Some(&old_score) = self.member_to_score.get(&member) {
            if old_score == score {
                return;
            }
            self.remove_from_node(old_score, &member);
        }

        self.member_to_score.insert(member.clone(), score);

        if let Some(&idx) = self.score_to_node.get(&score) {
            self.nodes[idx].members.insert(member);
            return;
        }

        let height = roll_height();
        while self.head.len() < height + 1 {
            self.head.push(None);
        }

        let node_idx = self.nodes.len();
        let mut members = HashSet::new();
        members.insert(member);
        self.nodes.push(Node {
            score,
            members,
            next: vec![None; height + 1],
        });
        self.score_to_node.insert(score, node_idx);

        // Walk top-down, splicing the new node into every level whose current successor has a
        // greater score.
        let mut level = height as isize;
        let mut cur: Option<usize> = None; // None denotes the head sentinel.
        while level >= 0 {
            let l = level as usize;
            loop {
                let next = match cur {
                    Some(c) => self.nodes[c].next[l],
                    None => self.head[l],
                };
                match next {
                    Some(n) if self.nodes[n].score < score => cur = Some(n),
                    _ => break,
                }
            }
            let next_ptr = match cur {
                Some(c) => self.nodes[c].next[l],
                None => self.head[l],
            };
            self.nodes[node_idx].next[l] = next_ptr;
            match cur {
                Some(c) => self.nodes[c].next[l] = Some(node_idx),
                None => self.head[l] = Some(node_idx),
            }
            level -= 1;
        }
    }

    /// Removes `member` from wherever it lives. Returns 1 if it was present, else 0.
    pub fn remove(&mut self, member: &M) -> i64 {
        let Some(score) = self.member_to_score.remove(member) else {
            return 0;
        };
        self.remove_from_node(score, member);
        1
    }

    fn remove_from_node(&mut self, score: i64, member: &M) {
        let Some(&idx) = self.score_to_node.get(&score) else {
            return;
        };
        self.nodes[idx].members.remove(member);
        if !self.nodes[idx].members.is_empty() {
            return;
        }

        // The node's member set is now empty: unsplice it from every level it participates in.
        self.score_to_node.remove(&score);
        let height = self.nodes[idx].next.len();
        for l in 0..height {
            let mut cur: Option<usize> = None;
            loop {
                let next = match cur {
                    Some(c) => self.nodes[c].next.get(l).copied().flatten(),
                    None => self.head.get(l).copied().flatten(),
                };
                match next {
                    Some(n) if n == idx => {
                        let after = self.nodes[idx].next[l];
                        match cur {
                            Some(c) => self.nodes[c].next[l] = after,
                            None => self.head[l] = after,
                        }
                        break;
                    }
                    Some(n) if self.nodes[n].score < score => cur = Some(n),
                    _ => break,
                }
            }
        }
    }

    /// Returns all members with `lo <= score <= hi`, with `hi == -1` meaning +infinity. Order
    /// within a score is unspecified.
    pub fn range(&self, lo: i64, hi: i64) -> Vec<M> {
        let hi = if hi == -1 { i64::MAX } else { hi };
        if lo > hi {
            return Vec::new();
        }

        let mut cur: Option<usize> = None;
        for l in (0..self.head.len()).rev() {
            loop {
                let next = match cur {
                    Some(c) => self.nodes[c].next[l],
                    None => self.head[l],
                };
                match next {
                    Some(n) if self.nodes[n].score < lo => cur = Some(n),
                    _ => break,
                }
            }
        }

        let mut out = Vec::new();
        let mut next = match cur {
            Some(c) => self.nodes[c].next.first().copied().flatten(),
            None => self.head.first().copied().flatten(),
        };
        while let Some(n) = next {
            let node = &self.nodes[n];
            if node.score < lo || node.score > hi {
                break;
            }
            out.extend(node.members.iter().cloned());
            next = node.next[0];
        }
        out
    }

    /// Returns every (score, member) pair, in ascending score order. Used by the sorted-set
    /// rebuild-command view.
    pub fn iter_all(&self) -> Vec<(i64, M)> {
        let mut out = Vec::with_capacity(self.member_to_score.len());
        let mut next = self.head.first().copied().flatten();
        while let Some(n) = next {
            let node = &self.nodes[n];
            for m in &node.members {
                out.push((node.score, m.clone()));
            }
            next = node.next[0];
        }
        out
    }
}

impl<M: Eq + Hash + Clone> Default for SkipList<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Geometric height draw: `h <- 0; while coin == 1 do h <- h + 1`.
fn roll_height() -> usize {
    let mut h = 0;
    let mut rng = rand::thread_rng();
    while rng.gen_range(0..2) == 1 {
        h += 1;
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_range() {
        let mut s = SkipList::new();
        s.add(10, "a");
        s.add(5, "b");
        s.add(15, "c");
        let mut r = s.range(6, 12);
        r.sort();
        assert_eq!(r, vec!["a"]);

        let mut all = s.range(0, -1);
        all.sort();
        assert_eq!(all, vec!["a", "b", "c"]);
    }

    #[test]
    fn re_add_moves_member() {
        let mut s = SkipList::new();
        s.add(1, "a");
        s.add(2, "a");
        assert_eq!(s.score_of(&"a"), Some(2));
        assert_eq!(s.range(1, 1), Vec::<&str>::new());
        assert_eq!(s.range(2, 2), vec!["a"]);
    }

    #[test]
    fn remove_empties_node() {
        let mut s = SkipList::new();
        s.add(1, "a");
        s.add(1, "b");
        assert_eq!(s.remove(&"a"), 1);
        assert_eq!(s.remove(&"a"), 0);
        assert_eq!(s.range(0, -1), vec!["b"]);
        assert_eq!(s.remove(&"b"), 1);
        assert!(s.is_empty());
        assert_eq!(s.range(0, -1), Vec::<&str>::new());
    }

    #[test]
    fn many_inserts_preserve_order() {
        let mut s = SkipList::new();
        for i in (0..200).rev() {
            s.add(i, i);
        }
        let all = s.range(0, -1);
        let scores: Vec<i64> = all;
        let mut sorted = scores.clone();
        sorted.sort();
        assert_eq!(scores, sorted);
    }
}
