use tribles_hexastore::query::{build, open};
use tribles_hexastore::term::{PatternQuad, PatternTerm as PT, Term};
use tribles_hexastore::test::sample_data;

fn schema_iri(name: &str) -> Term {
    Term::iri(format!("http://schema.org/{name}"))
}

#[test]
fn exact_value_lookup_yields_one_match() {
    let (dict, kv) = sample_data();
    let jane = Term::iri("http://people.com/jane");

    let pattern = vec![PatternQuad::new(PT::Ground(jane), PT::Ground(schema_iri("name")), PT::var("name"))];
    let graph = build(&pattern, &dict, &kv).unwrap();
    let mut cursor = open(&graph, &kv, &dict, None, None).unwrap();

    assert!(cursor.next(None).unwrap());
    assert_eq!(cursor.get("name").unwrap(), Some(Term::literal("Jane Doe")));
    assert!(!cursor.next(None).unwrap());
}

#[test]
fn object_only_lookup_finds_the_owning_subject() {
    let (dict, kv) = sample_data();

    let pattern = vec![PatternQuad::new(
        PT::var("who"),
        PT::Ground(schema_iri("name")),
        PT::Ground(Term::literal("Jane Doe")),
    )];
    let graph = build(&pattern, &dict, &kv).unwrap();
    let mut cursor = open(&graph, &kv, &dict, None, None).unwrap();

    assert!(cursor.next(None).unwrap());
    assert_eq!(cursor.get("who").unwrap(), Some(Term::iri("http://people.com/jane")));
    assert!(!cursor.next(None).unwrap());
}

#[test]
fn typed_enumeration_visits_every_person() {
    let (dict, kv) = sample_data();

    let pattern = vec![
        PatternQuad::new(PT::var("person"), PT::Ground(schema_iri("type")), PT::Ground(schema_iri("Person"))),
        PatternQuad::new(PT::var("person"), PT::Ground(schema_iri("birthDate")), PT::var("born")),
    ];
    let graph = build(&pattern, &dict, &kv).unwrap();
    let mut cursor = open(&graph, &kv, &dict, None, None).unwrap();

    let mut seen = Vec::new();
    while cursor.next(None).unwrap() {
        seen.push((cursor.get("person").unwrap().unwrap(), cursor.get("born").unwrap().unwrap()));
    }
    seen.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));

    assert_eq!(
        seen,
        vec![
            (Term::iri("http://people.com/jane"), Term::literal("1990-01-01")),
            (Term::iri("http://people.com/john"), Term::literal("1985-05-05")),
        ]
    );
}

#[test]
fn two_hop_join_follows_knows_to_a_named_person() {
    let (dict, kv) = sample_data();

    // Every person who knows someone named "Jane Doe".
    let pattern = vec![
        PatternQuad::new(PT::var("a"), PT::Ground(schema_iri("type")), PT::Ground(schema_iri("Person"))),
        PatternQuad::new(PT::var("a"), PT::Ground(schema_iri("knows")), PT::var("b")),
        PatternQuad::new(PT::var("b"), PT::Ground(schema_iri("name")), PT::Ground(Term::literal("Jane Doe"))),
    ];
    let graph = build(&pattern, &dict, &kv).unwrap();
    let mut cursor = open(&graph, &kv, &dict, None, None).unwrap();

    assert!(cursor.next(None).unwrap());
    assert_eq!(cursor.get("a").unwrap(), Some(Term::iri("http://people.com/john")));
    assert!(!cursor.next(None).unwrap());
}

#[test]
fn starting_index_resumes_at_the_seeded_value() {
    let (dict, kv) = sample_data();

    let pattern = vec![PatternQuad::new(PT::var("a"), PT::Ground(schema_iri("name")), PT::var("b"))];
    let graph = build(&pattern, &dict, &kv).unwrap();

    let seeds = vec![(
        "a".to_string(),
        Term::iri("http://people.com/john"),
    )];
    let mut cursor = open(&graph, &kv, &dict, None, Some(&seeds)).unwrap();

    // John sorts after Jane by insertion order; resuming at John yields
    // exactly the suffix starting there.
    assert!(cursor.next(None).unwrap());
    assert_eq!(cursor.get("a").unwrap(), Some(Term::iri("http://people.com/john")));
    assert!(!cursor.next(None).unwrap());
}

#[test]
fn independent_variable_is_not_dropped_by_backtracking() {
    // `p2` shares no triple with `p1` or `friend`; it must still range over
    // every person for each `(p1, friend)` pair instead of being silently
    // skipped on backtrack (spec.md §8 "Completeness").
    let (dict, kv) = sample_data();

    let pattern = vec![
        PatternQuad::new(PT::var("p1"), PT::Ground(schema_iri("type")), PT::Ground(schema_iri("Person"))),
        PatternQuad::new(PT::var("p2"), PT::Ground(schema_iri("type")), PT::Ground(schema_iri("Person"))),
        PatternQuad::new(PT::var("p1"), PT::Ground(schema_iri("knows")), PT::var("friend")),
    ];
    let graph = build(&pattern, &dict, &kv).unwrap();
    let mut cursor = open(&graph, &kv, &dict, None, None).unwrap();

    let mut seen = Vec::new();
    while cursor.next(None).unwrap() {
        seen.push((
            cursor.get("p1").unwrap().unwrap(),
            cursor.get("p2").unwrap().unwrap(),
            cursor.get("friend").unwrap().unwrap(),
        ));
    }
    seen.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));

    let jane = Term::iri("http://people.com/jane");
    let john = Term::iri("http://people.com/john");
    let mut expected = vec![
        (jane.clone(), jane.clone(), john.clone()),
        (jane.clone(), john.clone(), john.clone()),
        (john.clone(), jane.clone(), jane.clone()),
        (john.clone(), john.clone(), jane.clone()),
    ];
    expected.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));

    assert_eq!(seen, expected);
}

#[test]
fn unknown_ground_term_yields_no_results_without_erroring() {
    let (dict, kv) = sample_data();

    let pattern = vec![PatternQuad::new(
        PT::var("x"),
        PT::Ground(Term::iri("http://schema.org/name")),
        PT::Ground(Term::literal("Nobody Has This Name")),
    )];
    let graph = build(&pattern, &dict, &kv).unwrap();
    assert!(!graph.is_satisfiable());
    let mut cursor = open(&graph, &kv, &dict, None, None).unwrap();
    assert!(!cursor.next(None).unwrap());
}
