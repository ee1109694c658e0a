//! RDF-ish terms and the pattern quads a query is built from.

use std::fmt;

/// Identifies the stored dataset a blank node is scoped to, the content
/// hash of its canonical N-Quads (see [`SPEC_FULL.md`] §4: "dataset-scoped
/// blank nodes"). Computing this hash is part of the (out of scope) ingest
/// path; the query engine only ever compares/stores already-computed hashes.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatasetId(pub [u8; 32]);

impl DatasetId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        DatasetId(bytes)
    }

    pub fn of(bytes: &[u8]) -> Self {
        DatasetId(*blake3::hash(bytes).as_bytes())
    }
}

impl fmt::Debug for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..4] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..")
    }
}

/// A term as it appears in a *stored* dataset: a fully ground value.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Term {
    Iri(String),
    Literal {
        value: String,
        lang: Option<String>,
        datatype: Option<String>,
    },
    Blank { dataset: DatasetId, label: String },
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn literal_with_datatype(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            lang: None,
            datatype: Some(datatype.into()),
        }
    }

    /// The term's plain text value, used where a term stands in for a bare
    /// string (e.g. matching a stored graph name against a dictionary-
    /// resolved term — see [`crate::provenance::GraphCheck`]).
    pub fn text(&self) -> &str {
        match self {
            Term::Iri(s) => s,
            Term::Literal { value, .. } => value,
            Term::Blank { label, .. } => label,
        }
    }
}

/// A term as it appears in a *pattern*: either a ground [`Term`] or a
/// variable, identified by the blank-node label used in the pattern.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PatternTerm {
    Variable(String),
    Ground(Term),
}

impl PatternTerm {
    pub fn var(name: impl Into<String>) -> Self {
        PatternTerm::Variable(name.into())
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, PatternTerm::Variable(_))
    }

    pub fn variable_name(&self) -> Option<&str> {
        match self {
            PatternTerm::Variable(name) => Some(name.as_str()),
            PatternTerm::Ground(_) => None,
        }
    }
}

impl From<Term> for PatternTerm {
    fn from(term: Term) -> Self {
        PatternTerm::Ground(term)
    }
}

/// One quad of a pattern graph. `graph` is optional, matching spec.md's
/// "optional graph name" — a pattern quad with no graph term places no
/// constraint on which graph a matching triple belongs to.
#[derive(Clone, Debug)]
pub struct PatternQuad {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
    pub graph: Option<PatternTerm>,
}

impl PatternQuad {
    pub fn new(subject: PatternTerm, predicate: PatternTerm, object: PatternTerm) -> Self {
        PatternQuad {
            subject,
            predicate,
            object,
            graph: None,
        }
    }

    pub fn with_graph(mut self, graph: PatternTerm) -> Self {
        self.graph = Some(graph);
        self
    }
}

pub type Pattern = Vec<PatternQuad>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_id_is_content_addressed() {
        let a = DatasetId::of(b"dataset-a");
        let b = DatasetId::of(b"dataset-a");
        let c = DatasetId::of(b"dataset-b");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn pattern_term_classifies_variables() {
        let v = PatternTerm::var("x");
        let g = PatternTerm::Ground(Term::iri("http://example.com/a"));
        assert!(v.is_variable());
        assert!(!g.is_variable());
        assert_eq!(v.variable_name(), Some("x"));
    }
}
