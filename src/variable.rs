//! A [`Variable`] owns the constraint sets a pattern's blank-node label
//! compiles into, plus (once a query is solving) its current binding and
//! candidate stream (spec.md §3, "Variable").

use std::collections::BTreeMap;

use crate::constraint::Constraint;
use crate::hexastore::ReflexivePlace;
use crate::id::Id;

#[derive(Clone, Debug)]
pub struct ZeroDegreeConstraint {
    pub place: ReflexivePlace,
    pub constraint: Constraint,
}

#[derive(Debug, Default)]
pub struct Variable {
    pub name: String,
    /// Triples where this variable is the only unknown.
    pub first_degree: Vec<Constraint>,
    /// Triples where this variable occupies two positions at once.
    pub zero_degree: Vec<ZeroDegreeConstraint>,
    /// Triples shared with exactly one other variable, keyed by that
    /// co-variable's name.
    pub second_degree: BTreeMap<String, Vec<Constraint>>,
    /// The cardinality estimate computed by [`crate::scorer`]; smaller is
    /// tighter and sorts earlier.
    pub score: u64,
    /// Set once this variable is bound during solving.
    pub current: Option<Id>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            first_degree: Vec::new(),
            zero_degree: Vec::new(),
            second_degree: BTreeMap::new(),
            score: 0,
            current: None,
        }
    }

    pub fn has_ground_anchor(&self) -> bool {
        !self.first_degree.is_empty() || !self.zero_degree.is_empty()
    }

    /// Pushes `constraint` onto the first-degree set if an equivalent
    /// `(permutation, m, n)` constraint isn't already present, implementing
    /// spec.md §4.1's "keyed by the concatenation of the two ground term
    /// names (for deduplication)" — ground term names map one-to-one onto
    /// dictionary identifiers, so deduplicating on the resolved ids is
    /// equivalent and avoids threading the original names through.
    pub fn push_first_degree(&mut self, constraint: Constraint) {
        let duplicate = self
            .first_degree
            .iter()
            .any(|c| c.permutation == constraint.permutation && c.m == constraint.m && c.n == constraint.n);
        if !duplicate {
            self.first_degree.push(constraint);
        }
    }

    pub fn push_second_degree(&mut self, co_variable: impl Into<String>, constraint: Constraint) -> usize {
        let entry = self.second_degree.entry(co_variable.into()).or_default();
        entry.push(constraint);
        entry.len() - 1
    }
}
