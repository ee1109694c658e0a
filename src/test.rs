//! Sample stores used by this crate's own tests and by `tests/` (spec.md
//! §8's scenario seeds). Not part of the query path; this is the same kind
//! of test-only ingest shortcut [`crate::kv::InMemoryKv`]'s docs describe.

use crate::dictionary::InMemoryDictionary;
use crate::hexastore::insert_triple;
use crate::kv::InMemoryKv;
use crate::term::Term;

fn insert(dict: &mut InMemoryDictionary, kv: &mut InMemoryKv, s: &Term, p: &Term, o: &Term) {
    let sid = dict.intern(s.clone());
    let pid = dict.intern(p.clone());
    let oid = dict.intern(o.clone());
    insert_triple(kv, sid, pid, oid);
}

/// A small social-graph dataset: two people, their names, birth dates and a
/// mutual `knows` relationship.
pub fn sample_data() -> (InMemoryDictionary, InMemoryKv) {
    let mut dict = InMemoryDictionary::new();
    let mut kv = InMemoryKv::new();

    let rdf_type = Term::iri("http://schema.org/type");
    let person = Term::iri("http://schema.org/Person");
    let name = Term::iri("http://schema.org/name");
    let birth_date = Term::iri("http://schema.org/birthDate");
    let knows = Term::iri("http://schema.org/knows");

    let jane = Term::iri("http://people.com/jane");
    let john = Term::iri("http://people.com/john");

    insert(&mut dict, &mut kv, &jane, &rdf_type, &person);
    insert(&mut dict, &mut kv, &jane, &name, &Term::literal("Jane Doe"));
    insert(&mut dict, &mut kv, &jane, &birth_date, &Term::literal("1990-01-01"));
    insert(&mut dict, &mut kv, &jane, &knows, &john);

    insert(&mut dict, &mut kv, &john, &rdf_type, &person);
    insert(&mut dict, &mut kv, &john, &name, &Term::literal("Johnny Doe"));
    insert(&mut dict, &mut kv, &john, &birth_date, &Term::literal("1985-05-05"));
    insert(&mut dict, &mut kv, &john, &knows, &jane);

    (dict, kv)
}

/// A second, disjoint dataset (an organization, not a person) used by tests
/// that need more than one unrelated entity in the store.
pub fn sample_data2() -> (InMemoryDictionary, InMemoryKv) {
    let mut dict = InMemoryDictionary::new();
    let mut kv = InMemoryKv::new();

    let rdf_type = Term::iri("http://schema.org/type");
    let organization = Term::iri("http://schema.org/Organization");
    let name = Term::iri("http://schema.org/name");
    let acme = Term::iri("http://example.com/acme");

    insert(&mut dict, &mut kv, &acme, &rdf_type, &organization);
    insert(&mut dict, &mut kv, &acme, &name, &Term::literal("Acme Corp"));

    (dict, kv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;
    use crate::hexastore::{Hexastore, Permutation};
    use crate::kv::KvStore;

    #[test]
    fn sample_data_indexes_both_people() {
        let (dict, kv) = sample_data();
        let hx = Hexastore::new(&kv);
        let jane = dict.lookup(&Term::iri("http://people.com/jane")).unwrap().unwrap();
        let name = dict.lookup(&Term::iri("http://schema.org/name")).unwrap().unwrap();
        let range = hx.triple_range(Permutation::Spo, jane, name).unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn sample_data2_is_disjoint_from_sample_data() {
        let (_, kv1) = sample_data();
        let (_, kv2) = sample_data2();
        assert_ne!(kv1.scan_prefix(&[]).unwrap().len(), 0);
        assert_ne!(kv2.scan_prefix(&[]).unwrap().len(), 0);
    }
}
