//! The six-permutation hexastore index and the range/count primitives the
//! query engine reads through.
//!
//! Every stored triple is indexed under all six orderings of its three
//! positions. The three orderings that start with the subject, predicate or
//! object respectively (`Spo`, `Pos`, `Osp`) are the *major* permutations;
//! the other three (`Sop`, `Pso`, `Ops`) are the *minor* ones. Each
//! permutation owns one byte-prefixed triple keyspace (`prefix ‖ id1:8 ‖
//! id2:8 ‖ id3:8`) and one byte-prefixed two-term count keyspace (`prefix ‖
//! idA:8 ‖ idB:8 → uint64`).

use arrayvec::ArrayVec;

use crate::id::Id;
use crate::kv::{KvError, KvStore};

/// Every key this module builds fits a triple prefix byte plus three 8-byte
/// identifiers; stack-allocating that avoids a heap hit per range scan.
const MAX_KEY_LEN: usize = 1 + 3 * 8;

/// One of the six orderings of (subject, predicate, object).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Permutation {
    Spo,
    Pos,
    Osp,
    Sop,
    Pso,
    Ops,
}

/// Which single position of a triple a variable occupies.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Place {
    S,
    P,
    O,
}

/// Which *pair* of positions a zero-degree reflexive constraint shares,
/// named by the order the shared variable's positions appear in the
/// permutation used to scan for it (spec.md §4.1).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ReflexivePlace {
    /// S and P are the same variable; O is the ground term.
    Sp,
    /// O and S are the same variable; P is the ground term.
    Os,
    /// P and O are the same variable; S is the ground term.
    Po,
}

impl Permutation {
    pub fn is_major(self) -> bool {
        matches!(self, Permutation::Spo | Permutation::Pos | Permutation::Osp)
    }

    pub fn triple_prefix(self) -> u8 {
        match self {
            Permutation::Spo => 0,
            Permutation::Pos => 1,
            Permutation::Osp => 2,
            Permutation::Sop => 3,
            Permutation::Pso => 4,
            Permutation::Ops => 5,
        }
    }

    pub fn count_prefix(self) -> u8 {
        // Count keyspaces live in their own byte range, disjoint from the
        // triple keyspaces above.
        self.triple_prefix() + 16
    }

    /// The permutation whose slot order is exactly `(p1, p2, p3)`.
    pub fn from_order(p1: Place, p2: Place, p3: Place) -> Permutation {
        use Place::*;
        match (p1, p2, p3) {
            (S, P, O) => Permutation::Spo,
            (P, O, S) => Permutation::Pos,
            (O, S, P) => Permutation::Osp,
            (S, O, P) => Permutation::Sop,
            (P, S, O) => Permutation::Pso,
            (O, P, S) => Permutation::Ops,
            _ => panic!("from_order requires a permutation of S, P, O (got {p1:?}, {p2:?}, {p3:?})"),
        }
    }
}

fn triple_key(perm: Permutation, id1: Id, id2: Id, id3: Id) -> ArrayVec<u8, MAX_KEY_LEN> {
    let mut key = ArrayVec::new();
    key.push(perm.triple_prefix());
    key.try_extend_from_slice(&id1.to_be_bytes()).expect("key fits MAX_KEY_LEN");
    key.try_extend_from_slice(&id2.to_be_bytes()).expect("key fits MAX_KEY_LEN");
    key.try_extend_from_slice(&id3.to_be_bytes()).expect("key fits MAX_KEY_LEN");
    key
}

pub(crate) fn spo_key(s: Id, p: Id, o: Id) -> Vec<u8> {
    triple_key(Permutation::Spo, s, p, o).to_vec()
}

fn two_term_prefix(perm: Permutation, id1: Id, id2: Id) -> ArrayVec<u8, MAX_KEY_LEN> {
    let mut key = ArrayVec::new();
    key.push(perm.triple_prefix());
    key.try_extend_from_slice(&id1.to_be_bytes()).expect("key fits MAX_KEY_LEN");
    key.try_extend_from_slice(&id2.to_be_bytes()).expect("key fits MAX_KEY_LEN");
    key
}

fn one_term_prefix(perm: Permutation, id1: Id) -> ArrayVec<u8, MAX_KEY_LEN> {
    let mut key = ArrayVec::new();
    key.push(perm.triple_prefix());
    key.try_extend_from_slice(&id1.to_be_bytes()).expect("key fits MAX_KEY_LEN");
    key
}

fn count_key(perm: Permutation, id_a: Id, id_b: Id) -> ArrayVec<u8, MAX_KEY_LEN> {
    let mut key = ArrayVec::new();
    key.push(perm.count_prefix());
    key.try_extend_from_slice(&id_a.to_be_bytes()).expect("key fits MAX_KEY_LEN");
    key.try_extend_from_slice(&id_b.to_be_bytes()).expect("key fits MAX_KEY_LEN");
    key
}

fn count_prefix_one_term(perm: Permutation, id_a: Id) -> ArrayVec<u8, MAX_KEY_LEN> {
    let mut key = ArrayVec::new();
    key.push(perm.count_prefix());
    key.try_extend_from_slice(&id_a.to_be_bytes()).expect("key fits MAX_KEY_LEN");
    key
}

fn read_u64_be(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}

/// Read-only access to the hexastore, given any [`KvStore`].
pub struct Hexastore<'a, K: KvStore + ?Sized> {
    kv: &'a K,
}

impl<'a, K: KvStore + ?Sized> Hexastore<'a, K> {
    pub fn new(kv: &'a K) -> Self {
        Hexastore { kv }
    }

    pub(crate) fn kv_ref(&self) -> &K {
        self.kv
    }

    /// The ascending list of third-identifiers for triples whose first two
    /// positions (in `perm`'s order) equal `(m, n)`.
    pub fn triple_range(&self, perm: Permutation, m: Id, n: Id) -> Result<Vec<Id>, KvError> {
        let prefix = two_term_prefix(perm, m, n);
        let rows = self.kv.scan_prefix(&prefix)?;
        Ok(rows
            .into_iter()
            .filter_map(|(key, _)| Id::take_be(&key[prefix.len()..]).map(|(id, _)| id))
            .collect())
    }

    /// The ascending list of `(second, third)` identifier pairs for triples
    /// whose first position (in `perm`'s order) equals `m`. Used by
    /// zero-degree reflexive constraints, which scan a single ground
    /// position and filter on the remaining two positions being equal.
    pub fn pair_range(&self, perm: Permutation, m: Id) -> Result<Vec<(Id, Id)>, KvError> {
        let prefix = one_term_prefix(perm, m);
        let rows = self.kv.scan_prefix(&prefix)?;
        Ok(rows
            .into_iter()
            .filter_map(|(key, _)| {
                let rest = &key[prefix.len()..];
                let (second, rest) = Id::take_be(rest)?;
                let (third, _) = Id::take_be(rest)?;
                Some((second, third))
            })
            .collect())
    }

    /// The stored two-term count for `(m, n)` under `perm`; `0` if absent.
    pub fn count(&self, perm: Permutation, m: Id, n: Id) -> Result<u64, KvError> {
        match self.kv.get(&count_key(perm, m, n))? {
            Some(bytes) if bytes.len() >= 8 => Ok(read_u64_be(&bytes)),
            _ => Ok(0),
        }
    }

    /// The number of triples with only the first position (in `perm`'s
    /// order) fixed to `m`, derived by summing the stored two-term counts
    /// that share that first identifier. This realizes spec.md's "one-term
    /// count" used as an upper bound by the scorer — the store only
    /// directly indexes two-term counts, so a one-term count is their sum
    /// over the second position (see DESIGN.md, "cardinality of reflexive
    /// constraints").
    pub fn one_term_count(&self, perm: Permutation, m: Id) -> Result<u64, KvError> {
        let prefix = count_prefix_one_term(perm, m);
        let rows = self.kv.scan_prefix(&prefix)?;
        Ok(rows
            .iter()
            .filter(|(_, v)| v.len() >= 8)
            .map(|(_, v)| read_u64_be(v))
            .sum())
    }
}

/// Ingest-facing helper (out of scope for the query path, used only by
/// [`crate::test`]'s sample stores) that writes the twelve entries a single
/// triple produces: six triple keys plus six two-term count increments.
pub fn insert_triple(kv: &mut crate::kv::InMemoryKv, s: Id, p: Id, o: Id) {
    use Permutation::*;
    let perms_and_order: [(Permutation, Id, Id, Id); 6] = [
        (Spo, s, p, o),
        (Pos, p, o, s),
        (Osp, o, s, p),
        (Sop, s, o, p),
        (Pso, p, s, o),
        (Ops, o, p, s),
    ];
    for (perm, a, b, c) in perms_and_order {
        kv.put(triple_key(perm, a, b, c).to_vec(), Vec::new());
        kv.add_count(count_key(perm, a, b).to_vec(), 1);
    }
}
