//! A [`Constraint`] is one pattern triple's contribution to one variable's
//! search space (spec.md §3, "Constraint").

use crate::hexastore::Permutation;
use crate::id::Id;

/// Points at the *other* constraint built from the same two-variable
/// pattern triple. Rather than a mutually-referencing pointer pair, the
/// dual link is an (other-variable-index, co-variable-name, slot) triple
/// into that variable's own constraint arena (spec.md §9, "Design Notes" —
/// this keeps the constraint graph acyclic by construction and avoids
/// aliasing hazards when the solver mutates a dual's prefix).
#[derive(Clone, Debug)]
pub struct Dual {
    pub variable: usize,
    pub co_variable: String,
    pub slot: usize,
}

/// One pattern triple's contribution to one variable's candidate set.
///
/// `m` and `n` are the pinned identifiers of the triple in the canonical
/// order implied by `permutation`; together with `permutation` they form a
/// contiguous key-space prefix. For a first-degree or zero-degree
/// constraint both are known at build time. For a second-degree constraint
/// `n` starts unset and is filled in at solve time from the co-variable's
/// current binding (see [`crate::cursor`]).
#[derive(Clone, Debug)]
pub struct Constraint {
    pub permutation: Permutation,
    pub m: Id,
    pub n: Option<Id>,
    pub dual: Option<Dual>,
}

impl Constraint {
    pub fn ground(permutation: Permutation, m: Id, n: Id) -> Self {
        Constraint {
            permutation,
            m,
            n: Some(n),
            dual: None,
        }
    }

    pub fn pending(permutation: Permutation, m: Id) -> Self {
        Constraint {
            permutation,
            m,
            n: None,
            dual: None,
        }
    }

    pub fn with_dual(mut self, dual: Dual) -> Self {
        self.dual = Some(dual);
        self
    }

    pub fn is_ready(&self) -> bool {
        self.n.is_some()
    }
}
