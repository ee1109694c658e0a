//! Compiles a pattern into a [`ConstraintGraph`] (spec.md §4.1).
//!
//! Each pattern quad is classified by how many of its subject, predicate and
//! object are variables, then turned into first-, zero- or second-degree
//! constraints attached to the variables it mentions. The optional graph
//! term of a quad is carried separately as a [`GraphCheck`], verified once a
//! full solution is assigned rather than constraining any hexastore range
//! (see `SPEC_FULL.md` §4, "Graph name in quads").

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::constraint::{Constraint, Dual};
use crate::dictionary::Dictionary;
use crate::hexastore::{Hexastore, Permutation, Place, ReflexivePlace};
use crate::id::Id;
use crate::kv::{KvError, KvStore};
use crate::provenance::{GraphCheck, GraphExpectation, Resolvable};
use crate::scorer;
use crate::sorter::{self, Dependencies};
use crate::term::{Pattern, PatternQuad, PatternTerm, Term};
use crate::variable::{Variable, ZeroDegreeConstraint};

/// Errors surfaced while compiling a pattern (spec.md §7.1).
#[derive(Debug)]
pub enum BuildError {
    /// A pattern triple whose subject, predicate and object are all
    /// variables has no ground anchor and cannot be evaluated.
    MalformedPattern,
    /// A quad's graph term is a variable that never appears as a subject,
    /// predicate or object elsewhere in the pattern, so it has no
    /// hexastore-backed candidate set to drive it (`SPEC_FULL.md` §4).
    UnanchoredGraphVariable(String),
    Kv(KvError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MalformedPattern => {
                write!(f, "pattern triple has no ground term to anchor it")
            }
            BuildError::UnanchoredGraphVariable(name) => {
                write!(f, "graph variable '{name}' is never bound as a subject, predicate or object")
            }
            BuildError::Kv(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<KvError> for BuildError {
    fn from(e: KvError) -> Self {
        BuildError::Kv(e)
    }
}

/// The compiled, scored and sorted representation of one pattern, ready to
/// be [`crate::query::open`]ed any number of times (spec.md §3,
/// "Constraint graph").
#[derive(Debug, Default)]
pub struct ConstraintGraph {
    pub(crate) variables: Vec<Variable>,
    pub(crate) deps: Dependencies,
    pub(crate) graph_checks: Vec<GraphCheck>,
    /// `false` once any ground term in the pattern is unknown to the
    /// dictionary (spec.md §7.2): the cursor yields zero solutions without
    /// this being an error.
    satisfiable: bool,
}

impl ConstraintGraph {
    fn unsatisfiable() -> Self {
        ConstraintGraph {
            variables: Vec::new(),
            deps: Dependencies::default(),
            graph_checks: Vec::new(),
            satisfiable: false,
        }
    }

    pub fn is_satisfiable(&self) -> bool {
        self.satisfiable
    }

    /// Variable names, in sorted execution order.
    pub fn ordered_names(&self) -> Vec<String> {
        self.deps
            .order
            .iter()
            .map(|&idx| self.variables[idx].name.clone())
            .collect()
    }

    pub(crate) fn variable_count(&self) -> usize {
        self.deps.order.len()
    }

    pub(crate) fn position_of(&self, name: &str) -> Option<usize> {
        self.deps.position.get(name).copied()
    }
}

/// One resolved slot of a triple: either a ground identifier or the name of
/// a pattern variable.
enum Slot {
    Ground(Id),
    Variable(String),
}

fn resolve_slot<D: Dictionary>(term: &PatternTerm, dict: &D) -> Result<Option<Slot>, BuildError> {
    match term {
        PatternTerm::Variable(name) => Ok(Some(Slot::Variable(name.clone()))),
        PatternTerm::Ground(t) => match dict.lookup(t)? {
            Some(id) => Ok(Some(Slot::Ground(id))),
            None => Ok(None),
        },
    }
}

struct Builder {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl Builder {
    fn new() -> Self {
        Builder {
            variables: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn get_or_create(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.variables.len();
        self.variables.push(Variable::new(name));
        self.index.insert(name.to_string(), idx);
        idx
    }
}

/// Compiles `pattern` into a [`ConstraintGraph`], reading `dict` for ground
/// term lookups and `kv` for the cardinality statistics the scorer needs.
pub fn build<K, D>(pattern: &Pattern, dict: &D, kv: &K) -> Result<ConstraintGraph, BuildError>
where
    K: KvStore + ?Sized,
    D: Dictionary,
{
    let mut builder = Builder::new();
    let mut graph_checks = Vec::new();
    let mut graph_variables_used = HashSet::new();

    for quad in pattern {
        let PatternQuad {
            subject,
            predicate,
            object,
            graph,
        } = quad;

        let s = resolve_slot(subject, dict)?;
        let p = resolve_slot(predicate, dict)?;
        let o = resolve_slot(object, dict)?;
        let (Some(s), Some(p), Some(o)) = (s, p, o) else {
            // spec.md §4.1: an unknown ground term makes the whole query
            // unsatisfiable; short-circuit rather than keep compiling.
            return Ok(ConstraintGraph::unsatisfiable());
        };

        let var_count = [is_variable(&s), is_variable(&p), is_variable(&o)]
            .iter()
            .filter(|v| **v)
            .count();

        if var_count == 3 {
            return Err(BuildError::MalformedPattern);
        }

        // A quad's graph term is classified and constrained independently of
        // how many of its subject/predicate/object slots are variables
        // (`SPEC_FULL.md` §4): even an all-ground quad (`var_count == 0`,
        // which `continue`s below without building any S/P/O constraint)
        // can carry a graph variable that needs registering here, or it
        // would be silently dropped instead of either being bound elsewhere
        // in the pattern or rejected as unanchored.
        if let Some(graph_term) = graph {
            match graph_term {
                PatternTerm::Variable(name) => {
                    graph_variables_used.insert(name.clone());
                }
                PatternTerm::Ground(_) => {}
            }
            graph_checks.push(build_graph_check(&s, &p, &o, graph_term, dict)?);
        }

        match var_count {
            0 => continue,
            1 => build_first_degree(&mut builder, &s, &p, &o),
            2 => build_two_variable(&mut builder, &s, &p, &o),
            _ => unreachable!(),
        }
    }

    for name in &graph_variables_used {
        if !builder.index.contains_key(name) {
            return Err(BuildError::UnanchoredGraphVariable(name.clone()));
        }
    }

    let hx = Hexastore::new(kv);
    scorer::score_all(&hx, &mut builder.variables)?;
    let deps = sorter::sort_and_link(&builder.variables);

    Ok(ConstraintGraph {
        variables: builder.variables,
        deps,
        graph_checks,
        satisfiable: true,
    })
}

fn is_variable(slot: &Slot) -> bool {
    matches!(slot, Slot::Variable(_))
}

fn build_graph_check<D: Dictionary>(
    s: &Slot,
    p: &Slot,
    o: &Slot,
    graph_term: &PatternTerm,
    _dict: &D,
) -> Result<GraphCheck, BuildError> {
    let expectation = match graph_term {
        PatternTerm::Ground(term) => GraphExpectation::Ground(term.text().to_string()),
        PatternTerm::Variable(name) => GraphExpectation::Variable(name.clone()),
    };
    Ok(GraphCheck {
        subject: resolvable(s),
        predicate: resolvable(p),
        object: resolvable(o),
        graph: expectation,
        permutation: Permutation::Spo,
    })
}

fn resolvable(slot: &Slot) -> Resolvable {
    match slot {
        Slot::Ground(id) => Resolvable::Ground(*id),
        Slot::Variable(name) => Resolvable::Variable(name.clone()),
    }
}

/// Exactly one of `s`, `p`, `o` is a variable; the other two are ground
/// (spec.md §4.1, "Exactly one variable").
fn build_first_degree(builder: &mut Builder, s: &Slot, p: &Slot, o: &Slot) {
    let (place, var_name, perm, m, n) = match (s, p, o) {
        (Slot::Variable(name), Slot::Ground(pp), Slot::Ground(oo)) => {
            (Place::S, name, Permutation::Pos, *pp, *oo)
        }
        (Slot::Ground(ss), Slot::Variable(name), Slot::Ground(oo)) => {
            (Place::P, name, Permutation::Osp, *oo, *ss)
        }
        (Slot::Ground(ss), Slot::Ground(pp), Slot::Variable(name)) => {
            (Place::O, name, Permutation::Spo, *ss, *pp)
        }
        _ => unreachable!("exactly one variable expected"),
    };
    let _ = place;
    let idx = builder.get_or_create(var_name);
    builder.variables[idx].push_first_degree(Constraint::ground(perm, m, n));
}

/// Exactly two of `s`, `p`, `o` are variables (spec.md §4.1, "Exactly two
/// variables"). If both name the same variable the triple is zero-degree
/// reflexive; otherwise it links two distinct variables via dual
/// constraints.
fn build_two_variable(builder: &mut Builder, s: &Slot, p: &Slot, o: &Slot) {
    match (s, p, o) {
        (Slot::Variable(a), Slot::Variable(b), Slot::Ground(oo)) if a == b => {
            build_reflexive(builder, a, ReflexivePlace::Sp, Permutation::Osp, *oo);
        }
        (Slot::Ground(ss), Slot::Variable(a), Slot::Variable(b)) if a == b => {
            build_reflexive(builder, a, ReflexivePlace::Po, Permutation::Spo, *ss);
        }
        (Slot::Variable(a), Slot::Ground(pp), Slot::Variable(b)) if a == b => {
            build_reflexive(builder, a, ReflexivePlace::Os, Permutation::Pos, *pp);
        }
        (Slot::Variable(a), Slot::Variable(b), Slot::Ground(oo)) => {
            link_duals(builder, a, Place::S, b, Place::P, Place::O, *oo);
        }
        (Slot::Ground(ss), Slot::Variable(a), Slot::Variable(b)) => {
            link_duals(builder, a, Place::P, b, Place::O, Place::S, *ss);
        }
        (Slot::Variable(a), Slot::Ground(pp), Slot::Variable(b)) => {
            link_duals(builder, a, Place::S, b, Place::O, Place::P, *pp);
        }
        _ => unreachable!("exactly two variables expected"),
    }
}

fn build_reflexive(builder: &mut Builder, name: &str, place: ReflexivePlace, perm: Permutation, ground: Id) {
    let idx = builder.get_or_create(name);
    builder.variables[idx].zero_degree.push(ZeroDegreeConstraint {
        place,
        constraint: Constraint::pending(perm, ground),
    });
}

/// Links the two distinct variables of a two-variable triple.
///
/// `a_place`/`b_place` are the triple positions owned by `a` and `b`
/// respectively; `ground_place` is the remaining ground position. Since any
/// ordering of (S, P, O) is one of the six [`Permutation`]s, the constraint
/// each side scans is simply the permutation whose order is
/// `(ground, other-variable, self)`.
fn link_duals(builder: &mut Builder, a: &str, a_place: Place, b: &str, b_place: Place, ground_place: Place, ground: Id) {
    let idx_a = builder.get_or_create(a);
    let idx_b = builder.get_or_create(b);

    let perm_a = Permutation::from_order(ground_place, b_place, a_place);
    let perm_b = Permutation::from_order(ground_place, a_place, b_place);

    let slot_a = builder.variables[idx_a].push_second_degree(b, Constraint::pending(perm_a, ground));
    let slot_b = builder.variables[idx_b].push_second_degree(a, Constraint::pending(perm_b, ground));

    builder.variables[idx_a]
        .second_degree
        .get_mut(b)
        .expect("just inserted")[slot_a]
        .dual = Some(Dual {
        variable: idx_b,
        co_variable: a.to_string(),
        slot: slot_b,
    });
    builder.variables[idx_b]
        .second_degree
        .get_mut(a)
        .expect("just inserted")[slot_b]
        .dual = Some(Dual {
        variable: idx_a,
        co_variable: b.to_string(),
        slot: slot_a,
    });
}
