//! The backtracking cursor / solver (spec.md §4.4).
//!
//! A [`Cursor`] owns one mutable walk over a [`ConstraintGraph`]: a current
//! binding per sorted variable, a lazily-computed candidate stream per
//! variable, and the k-way sorted intersection that stream is built from.
//! Dependency propagation (binding one variable's value into another's
//! "dual" constraint) and backtracking (jumping to `max(In[i])` on
//! exhaustion) are exactly the mechanisms spec.md §4.4 describes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use itertools::Itertools;

use crate::builder::ConstraintGraph;
use crate::constraint::{Constraint, Dual};
use crate::dictionary::Dictionary;
use crate::hexastore::Hexastore;
use crate::id::Id;
use crate::kv::{KvError, KvStore};
use crate::term::Term;
use crate::variable::ZeroDegreeConstraint;

/// Errors surfaced by the query path (spec.md §7.3).
#[derive(Debug)]
pub enum QueryError {
    /// The underlying KV store failed; the offending read is already
    /// annotated on the wrapped [`KvError`].
    Kv(KvError),
    /// A domain, pivot or starting-index name doesn't name a variable in
    /// the pattern this cursor was opened over.
    UnknownVariable(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Kv(e) => write!(f, "{e}"),
            QueryError::UnknownVariable(name) => write!(f, "no such variable: {name}"),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<KvError> for QueryError {
    fn from(e: KvError) -> Self {
        QueryError::Kv(e)
    }
}

/// Mutable per-query state for one sorted variable. Cloned out of the
/// (shared, immutable) [`ConstraintGraph`] at [`Cursor::new`] time so that
/// multiple cursors can walk the same compiled graph independently.
struct SolverVar {
    name: String,
    first_degree: Vec<Constraint>,
    zero_degree: Vec<ZeroDegreeConstraint>,
    second_degree: BTreeMap<String, Vec<Constraint>>,
    current: Option<Id>,
    /// The ascending candidate stream for this variable's *current* round,
    /// or `None` if it needs to be (re)computed before the next step.
    stream: Option<Vec<Id>>,
    /// Index into `stream` of the value currently emitted, if any.
    cursor: Option<usize>,
    /// A one-shot seek target consumed the first time `stream` is built
    /// (spec.md §4.4, "Domain restriction").
    seek: Option<Id>,
    /// Set when a starting-index term failed to resolve in the dictionary;
    /// this variable then never produces a candidate (spec.md §7.3: "key
    /// not found" is an empty stream, not an error).
    dead: bool,
}

fn build_vars(graph: &ConstraintGraph) -> Vec<SolverVar> {
    graph
        .deps
        .order
        .iter()
        .map(|&idx| {
            let v = &graph.variables[idx];
            SolverVar {
                name: v.name.clone(),
                first_degree: v.first_degree.clone(),
                zero_degree: v.zero_degree.clone(),
                second_degree: v.second_degree.clone(),
                current: None,
                stream: None,
                cursor: None,
                seek: None,
                dead: false,
            }
        })
        .collect()
}

/// The backtracking solution enumerator (spec.md §6, "Cursor").
pub struct Cursor<'a, K: KvStore + ?Sized, D: Dictionary> {
    hx: Hexastore<'a, K>,
    dict: &'a D,
    graph: &'a ConstraintGraph,
    /// Raw (pre-sort) variable index → sorted position, used to resolve a
    /// [`Dual`]'s `variable` field back into `vars`.
    raw_to_pos: Vec<usize>,
    vars: Vec<SolverVar>,
    /// Sorted positions exposed through [`Cursor::domain`]/[`Cursor::assignment`].
    domain: Vec<usize>,
    exhausted: bool,
    trivial_emitted: bool,
    /// Whether a full assignment has ever been produced. The very first
    /// call to [`Cursor::next`] has nothing to advance-and-cascade from, so
    /// it fills positions forward from 0 instead of starting at the deepest
    /// variable (spec.md §4.4 step 1 implicitly assumes a prior full
    /// assignment to resume from).
    started: bool,
    closed: bool,
}

impl<'a, K: KvStore + ?Sized, D: Dictionary> Cursor<'a, K, D> {
    /// Opens a cursor over `graph` (spec.md's `Open`). `domain` restricts
    /// which variables [`Cursor::assignment`] reports; `None` exposes all
    /// of them, in sorted execution order. `starting_index` seeks the named
    /// variables' iterators to the paired values before the first emission.
    pub fn new(
        graph: &'a ConstraintGraph,
        kv: &'a K,
        dict: &'a D,
        domain: Option<&[String]>,
        starting_index: Option<&[(String, Term)]>,
    ) -> Result<Self, QueryError> {
        let hx = Hexastore::new(kv);
        let mut vars = build_vars(graph);

        let mut raw_to_pos = vec![0usize; graph.variables.len()];
        for (pos, &idx) in graph.deps.order.iter().enumerate() {
            raw_to_pos[idx] = pos;
        }

        let domain_positions: Vec<usize> = match domain {
            Some(names) => names
                .iter()
                .map(|name| {
                    graph
                        .position_of(name)
                        .ok_or_else(|| QueryError::UnknownVariable(name.clone()))
                })
                .collect::<Result<_, _>>()?,
            None => (0..vars.len()).collect(),
        };

        if let Some(seeds) = starting_index {
            for (name, term) in seeds {
                let pos = graph
                    .position_of(name)
                    .ok_or_else(|| QueryError::UnknownVariable(name.clone()))?;
                match dict.lookup(term)? {
                    Some(id) => vars[pos].seek = Some(id),
                    None => vars[pos].dead = true,
                }
            }
        }

        Ok(Cursor {
            hx,
            dict,
            graph,
            raw_to_pos,
            vars,
            domain: domain_positions,
            exhausted: !graph.is_satisfiable(),
            trivial_emitted: false,
            started: false,
            closed: false,
        })
    }

    /// Variable names exposed by this cursor, in sorted execution order.
    pub fn domain(&self) -> Vec<String> {
        self.domain.iter().map(|&pos| self.vars[pos].name.clone()).collect()
    }

    /// The term currently bound to `name`, or `None` if unbound or unknown.
    pub fn get(&self, name: &str) -> Result<Option<Term>, QueryError> {
        let Some(var) = self.vars.iter().find(|v| v.name == name) else {
            return Ok(None);
        };
        match var.current {
            Some(id) => Ok(self.dict.resolve(id)?),
            None => Ok(None),
        }
    }

    /// Convenience over repeated [`Cursor::get`] calls: every domain
    /// variable's currently bound term, keyed by name.
    pub fn assignment(&self) -> Result<HashMap<String, Term>, QueryError> {
        let mut out = HashMap::with_capacity(self.domain.len());
        for &pos in &self.domain {
            let var = &self.vars[pos];
            if let Some(id) = var.current {
                if let Some(term) = self.dict.resolve(id)? {
                    out.insert(var.name.clone(), term);
                }
            }
        }
        Ok(out)
    }

    /// Advances to the next solution, returning `true` if one was produced
    /// or `false` at exhaustion (spec.md's `Next`). `pivot`, if given,
    /// forces the search to resume from that variable instead of the
    /// deepest one.
    pub fn next(&mut self, pivot: Option<&str>) -> Result<bool, QueryError> {
        if self.closed || self.exhausted {
            return Ok(false);
        }

        let n = self.vars.len();
        if n == 0 {
            if self.trivial_emitted {
                self.exhausted = true;
                return Ok(false);
            }
            self.trivial_emitted = true;
            return Ok(true);
        }

        let mut start = if !self.started {
            0
        } else {
            match pivot {
                Some(name) => self.var_position(name)?,
                None => n - 1,
            }
        };

        loop {
            if !self.run(start)? {
                self.exhausted = true;
                return Ok(false);
            }
            self.started = true;
            if self.graph_checks_pass()? {
                return Ok(true);
            }
            // This full assignment fails a graph-membership check; retry
            // as if the deepest variable had just been exhausted.
            start = n - 1;
        }
    }

    /// Releases this cursor's state. Idempotent, and run automatically on
    /// drop (spec.md §5: "releases all open iterators ... on every
    /// early-return error path").
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        for var in &mut self.vars {
            var.stream = None;
            var.cursor = None;
            var.current = None;
        }
        self.closed = true;
        self.exhausted = true;
    }

    fn var_position(&self, name: &str) -> Result<usize, QueryError> {
        self.graph
            .position_of(name)
            .ok_or_else(|| QueryError::UnknownVariable(name.to_string()))
    }

    /// The core advancement loop (spec.md §4.4, steps 2-5): advance `i`,
    /// cascading forward on success and backtracking to `max(In[i])` on
    /// exhaustion, until either a full assignment (every position bound)
    /// or total exhaustion is reached.
    fn run(&mut self, start: usize) -> Result<bool, QueryError> {
        let n = self.vars.len();
        let mut i = start;
        loop {
            if self.step(i)? {
                if i + 1 >= n {
                    return Ok(true);
                }
                for j in (i + 1)..n {
                    self.reset(j);
                }
                i += 1;
            } else {
                match self.graph.deps.in_deps[i].iter().copied().max() {
                    Some(k) => {
                        self.reset(i);
                        i = k;
                    }
                    None => return Ok(false),
                }
            }
        }
    }

    fn reset(&mut self, pos: usize) {
        self.vars[pos].stream = None;
        self.vars[pos].cursor = None;
        self.vars[pos].current = None;
    }

    /// Advances variable `pos` past its current value, building its
    /// candidate stream if this is the first visit this round.
    fn step(&mut self, pos: usize) -> Result<bool, QueryError> {
        if self.vars[pos].dead {
            return Ok(false);
        }

        if self.vars[pos].stream.is_none() {
            let candidates = self.compute_candidates(pos)?;
            let cursor = match self.vars[pos].seek.take() {
                Some(target) => {
                    let idx = candidates.partition_point(|&v| v < target);
                    idx.checked_sub(1)
                }
                None => None,
            };
            self.vars[pos].stream = Some(candidates);
            self.vars[pos].cursor = cursor;
        }

        let next_idx = self.vars[pos].cursor.map_or(0, |c| c + 1);
        let len = self.vars[pos].stream.as_ref().unwrap().len();
        if next_idx >= len {
            self.vars[pos].current = None;
            return Ok(false);
        }

        let value = self.vars[pos].stream.as_ref().unwrap()[next_idx];
        self.vars[pos].cursor = Some(next_idx);
        self.vars[pos].current = Some(value);
        self.propagate(pos, value);
        Ok(true)
    }

    /// Writes `value` into every dual constraint that `pos`'s second-degree
    /// constraints point at (spec.md §4.4, "Binding second-degree duals").
    fn propagate(&mut self, pos: usize, value: Id) {
        let duals: Vec<Dual> = self.vars[pos]
            .second_degree
            .values()
            .flat_map(|constraints| constraints.iter().filter_map(|c| c.dual.clone()))
            .collect();
        for dual in duals {
            let target_pos = self.raw_to_pos[dual.variable];
            if let Some(constraints) = self.vars[target_pos].second_degree.get_mut(&dual.co_variable) {
                constraints[dual.slot].n = Some(value);
            }
        }
    }

    /// The sorted-ascending intersection of every currently-ready
    /// constraint attached to variable `pos` (spec.md §4.4, "Per-variable
    /// iterator").
    fn compute_candidates(&self, pos: usize) -> Result<Vec<Id>, QueryError> {
        let var = &self.vars[pos];
        let mut streams: Vec<Vec<Id>> = Vec::new();

        for c in &var.first_degree {
            let n = c.n.expect("first-degree constraints are always ground");
            streams.push(self.hx.triple_range(c.permutation, c.m, n)?);
        }

        for zc in &var.zero_degree {
            let pairs = self.hx.pair_range(zc.constraint.permutation, zc.constraint.m)?;
            streams.push(pairs.into_iter().filter(|(a, b)| a == b).map(|(a, _)| a).collect());
        }

        for constraints in var.second_degree.values() {
            for c in constraints {
                match c.n {
                    // Co-variable already bound: the precise two-term range.
                    Some(n) => streams.push(self.hx.triple_range(c.permutation, c.m, n)?),
                    // Co-variable not bound yet: fall back to every value
                    // this variable's own column takes across the whole
                    // one-term range (scorer rule 3's upper bound, made
                    // concrete). Tightens on its own once the co-variable
                    // binds and this stream gets recomputed.
                    None => {
                        let pairs = self.hx.pair_range(c.permutation, c.m)?;
                        let own: Vec<Id> = pairs
                            .into_iter()
                            .map(|(_, own)| own)
                            .sorted()
                            .dedup()
                            .collect();
                        streams.push(own);
                    }
                }
            }
        }

        Ok(intersect_sorted(&streams))
    }

    fn graph_checks_pass(&self) -> Result<bool, QueryError> {
        for check in &self.graph.graph_checks {
            let ok = check.evaluate(&self.hx, self.dict, |name| {
                self.vars.iter().find(|v| v.name == name).and_then(|v| v.current)
            })?;
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<'a, K: KvStore + ?Sized, D: Dictionary> Drop for Cursor<'a, K, D> {
    fn drop(&mut self) {
        self.close();
    }
}

/// K-way sorted intersection with skip (spec.md §4.4, "Intersection";
/// §9, "Streaming intersection"). Adequate as a linear scan for the small
/// per-variable constraint counts typical patterns have.
fn intersect_sorted(streams: &[Vec<Id>]) -> Vec<Id> {
    if streams.is_empty() {
        return Vec::new();
    }

    let mut heads = vec![0usize; streams.len()];
    let mut out = Vec::new();

    loop {
        let mut max = None;
        for (stream, &head) in streams.iter().zip(&heads) {
            if head >= stream.len() {
                return out;
            }
            max = Some(max.map_or(stream[head], |m: Id| m.max(stream[head])));
        }
        let max = max.expect("streams is non-empty");

        let mut all_match = true;
        for (stream, head) in streams.iter().zip(heads.iter_mut()) {
            while *head < stream.len() && stream[*head] < max {
                *head += 1;
            }
            if *head >= stream.len() {
                return out;
            }
            if stream[*head] != max {
                all_match = false;
            }
        }

        if all_match {
            out.push(max);
            for head in heads.iter_mut() {
                *head += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_sorted_of_one_stream_is_identity() {
        let streams = vec![vec![Id(1), Id(3), Id(5)]];
        assert_eq!(intersect_sorted(&streams), vec![Id(1), Id(3), Id(5)]);
    }

    #[test]
    fn intersect_sorted_skips_to_common_values() {
        let streams = vec![vec![Id(1), Id(2), Id(4), Id(5)], vec![Id(2), Id(3), Id(5)]];
        assert_eq!(intersect_sorted(&streams), vec![Id(2), Id(5)]);
    }

    #[test]
    fn intersect_sorted_of_disjoint_streams_is_empty() {
        let streams = vec![vec![Id(1), Id(2)], vec![Id(3), Id(4)]];
        assert!(intersect_sorted(&streams).is_empty());
    }

    #[test]
    fn intersect_sorted_of_no_streams_is_empty() {
        let streams: Vec<Vec<Id>> = Vec::new();
        assert!(intersect_sorted(&streams).is_empty());
    }

    #[cfg(feature = "proptest")]
    mod proptests {
        use super::*;
        use proptest::collection::{btree_set, vec as pvec};
        use proptest::prelude::*;

        use crate::builder::build;
        use crate::dictionary::InMemoryDictionary;
        use crate::hexastore::insert_triple;
        use crate::kv::InMemoryKv;
        use crate::term::{PatternQuad, PatternTerm as PT};
        use std::collections::HashSet;

        fn ascending(set: std::collections::BTreeSet<u64>) -> Vec<Id> {
            set.into_iter().map(Id).collect()
        }

        proptest! {
            #[test]
            fn result_is_ascending_and_a_true_intersection(
                raw_streams in pvec(btree_set(0u64..64, 0..12), 1..5),
            ) {
                let streams: Vec<Vec<Id>> = raw_streams.into_iter().map(ascending).collect();
                let got = intersect_sorted(&streams);

                prop_assert!(got.windows(2).all(|w| w[0] < w[1]));
                for id in &got {
                    prop_assert!(streams.iter().all(|s| s.contains(id)));
                }
                if let Some(shortest) = streams.iter().min_by_key(|s| s.len()) {
                    for id in shortest {
                        if streams.iter().all(|s| s.contains(id)) {
                            prop_assert!(got.contains(id));
                        }
                    }
                }
            }
        }

        proptest! {
            // Regression coverage for spec.md §8's "Completeness" and
            // "Soundness" properties over a pattern shape with a genuinely
            // independent variable (`p2`, which shares no triple with
            // anything else) alongside a joined pair (`p1`/`friend`): the
            // cursor must enumerate exactly the brute-force cross product,
            // never silently dropping or inventing combinations.
            #[test]
            fn solver_is_sound_and_complete_over_independent_and_joined_variables(
                person_count in 1usize..5,
                edge_indices in pvec((0usize..4, 0usize..4), 0..8),
            ) {
                let persons: Vec<Term> = (0..person_count)
                    .map(|i| Term::iri(format!("urn:person:{i}")))
                    .collect();
                let edges: Vec<(usize, usize)> = edge_indices
                    .into_iter()
                    .filter(|&(a, b)| a < person_count && b < person_count)
                    .collect();

                let mut dict = InMemoryDictionary::new();
                let mut kv = InMemoryKv::new();
                let rdf_type = Term::iri("urn:type");
                let person_class = Term::iri("urn:Person");
                let knows = Term::iri("urn:knows");

                let type_id = dict.intern(rdf_type.clone());
                let class_id = dict.intern(person_class.clone());
                let knows_id = dict.intern(knows.clone());
                let person_ids: Vec<Id> = persons.iter().cloned().map(|t| dict.intern(t)).collect();

                for &id in &person_ids {
                    insert_triple(&mut kv, id, type_id, class_id);
                }
                for &(a, b) in &edges {
                    insert_triple(&mut kv, person_ids[a], knows_id, person_ids[b]);
                }

                let pattern = vec![
                    PatternQuad::new(PT::var("p1"), PT::Ground(rdf_type.clone()), PT::Ground(person_class.clone())),
                    PatternQuad::new(PT::var("p2"), PT::Ground(rdf_type.clone()), PT::Ground(person_class.clone())),
                    PatternQuad::new(PT::var("p1"), PT::Ground(knows.clone()), PT::var("friend")),
                ];

                let graph = build(&pattern, &dict, &kv).unwrap();
                let mut cursor = Cursor::new(&graph, &kv, &dict, None, None).unwrap();

                let mut got = HashSet::new();
                while cursor.next(None).unwrap() {
                    got.insert((
                        cursor.get("p1").unwrap().unwrap(),
                        cursor.get("p2").unwrap().unwrap(),
                        cursor.get("friend").unwrap().unwrap(),
                    ));
                }

                let mut expected = HashSet::new();
                for p1_idx in 0..person_count {
                    for p2_idx in 0..person_count {
                        for &(a, b) in &edges {
                            if a == p1_idx {
                                expected.insert((
                                    persons[p1_idx].clone(),
                                    persons[p2_idx].clone(),
                                    persons[b].clone(),
                                ));
                            }
                        }
                    }
                }

                prop_assert_eq!(got, expected);
            }
        }
    }
}
