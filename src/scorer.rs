//! Cardinality estimation used to order variables (spec.md §4.2).
//!
//! Smaller score means a tighter variable — fewer candidate values — and
//! sorts earlier in [`crate::sorter`]'s execution order. Every rule here
//! reads only count keys, never triple keys, so scoring a whole pattern is
//! cheap relative to actually enumerating it.

use crate::hexastore::Hexastore;
use crate::kv::{KvError, KvStore};
use crate::variable::Variable;

/// Scores one variable per spec.md §4.2's three rules, consulting `hx` for
/// the count keys each rule needs.
pub fn score<K: KvStore + ?Sized>(hx: &Hexastore<K>, var: &Variable) -> Result<u64, KvError> {
    if !var.first_degree.is_empty() {
        let mut min = u64::MAX;
        for c in &var.first_degree {
            let n = c.n.expect("first-degree constraints are always ground");
            let count = hx.count(c.permutation, c.m, n)?;
            min = min.min(count);
        }
        return Ok(min);
    }

    if let Some(zero) = var.zero_degree.first() {
        // spec.md §9 "cardinality of reflexive constraints": the store has
        // no direct count for `count{t : t.s = t.p}`; the one-term count of
        // the ground position is a loose but sound upper bound.
        return hx.one_term_count(zero.constraint.permutation, zero.constraint.m);
    }

    let mut sum = 0u64;
    for constraints in var.second_degree.values() {
        for c in constraints {
            sum = sum.saturating_add(hx.one_term_count(c.permutation, c.m)?);
        }
    }
    Ok(sum)
}

/// Scores every variable in place.
pub fn score_all<K: KvStore + ?Sized>(hx: &Hexastore<K>, variables: &mut [Variable]) -> Result<(), KvError> {
    for var in variables.iter_mut() {
        var.score = score(hx, var)?;
    }
    Ok(())
}
