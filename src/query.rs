//! Public entry point tying the dictionary, hexastore, builder and cursor
//! together (spec.md §6, "Query API surface").

use crate::builder::{self, BuildError, ConstraintGraph};
use crate::cursor::{Cursor, QueryError};
use crate::dictionary::Dictionary;
use crate::kv::KvStore;
use crate::term::{Pattern, Term};

/// Compiles `pattern` into a constraint graph (spec.md's `Build`), reading
/// `dict` for ground-term lookups and `kv` for the cardinality statistics
/// the scorer needs.
pub fn build<K, D>(pattern: &Pattern, dict: &D, kv: &K) -> Result<ConstraintGraph, BuildError>
where
    K: KvStore + ?Sized,
    D: Dictionary,
{
    builder::build(pattern, dict, kv)
}

/// Opens a cursor over `graph` (spec.md's `Open`).
///
/// `domain` restricts which variables are exposed through
/// [`Cursor::assignment`]/[`Cursor::get`]; `None` exposes every variable in
/// sorted execution order. `starting_index` seeds a resume point: each
/// listed variable's candidate stream is seeked to the paired value (the
/// stored value itself included) before the first solution is emitted.
pub fn open<'a, K, D>(
    graph: &'a ConstraintGraph,
    kv: &'a K,
    dict: &'a D,
    domain: Option<&[String]>,
    starting_index: Option<&[(String, Term)]>,
) -> Result<Cursor<'a, K, D>, QueryError>
where
    K: KvStore + ?Sized,
    D: Dictionary,
{
    Cursor::new(graph, kv, dict, domain, starting_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{PatternQuad, PatternTerm as PT};
    use crate::test::sample_data;

    #[test]
    fn build_then_open_finds_a_single_ground_lookup() {
        let (dict, kv) = sample_data();
        let jane = Term::iri("http://people.com/jane");
        let name_pred = Term::iri("http://schema.org/name");

        let pattern = vec![PatternQuad::new(PT::Ground(jane), PT::Ground(name_pred), PT::var("x"))];
        let graph = build(&pattern, &dict, &kv).unwrap();
        let mut cursor = open(&graph, &kv, &dict, None, None).unwrap();

        assert!(cursor.next(None).unwrap());
        assert_eq!(cursor.get("x").unwrap(), Some(Term::literal("Jane Doe")));
        assert!(!cursor.next(None).unwrap());
    }

    #[test]
    fn open_rejects_an_unknown_domain_name() {
        let (dict, kv) = sample_data();
        let jane = Term::iri("http://people.com/jane");
        let name_pred = Term::iri("http://schema.org/name");
        let pattern = vec![PatternQuad::new(PT::Ground(jane), PT::Ground(name_pred), PT::var("x"))];
        let graph = build(&pattern, &dict, &kv).unwrap();

        let domain = vec!["not-a-variable".to_string()];
        assert!(matches!(
            open(&graph, &kv, &dict, Some(&domain), None),
            Err(QueryError::UnknownVariable(_))
        ));
    }
}
