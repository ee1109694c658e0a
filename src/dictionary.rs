//! The term dictionary: read-only `Term ⇄ Id` lookup during query planning.
//!
//! Writing new entries into the dictionary belongs to the (out of scope)
//! ingest path. The query engine only ever calls [`Dictionary::lookup`] and
//! [`Dictionary::resolve`].

use std::collections::HashMap;

use crate::id::{Id, IdCounter};
use crate::kv::KvError;
use crate::term::Term;

pub trait Dictionary {
    /// The identifier assigned to `term`, or `None` if the store has never
    /// seen it. Per spec.md §7.2 this is not an error: an unresolvable
    /// ground term makes the surrounding pattern unsatisfiable, not broken.
    fn lookup(&self, term: &Term) -> Result<Option<Id>, KvError>;

    /// The term an identifier was assigned to, used to translate bound
    /// variable values back into the caller's vocabulary.
    fn resolve(&self, id: Id) -> Result<Option<Term>, KvError>;
}

/// An in-memory dictionary, used by this crate's tests and sample stores.
/// A real deployment would back this with the `IndexPrefix`/`ValuePrefix`
/// keyspaces of the same KV store the hexastore reads from (spec.md §6).
#[derive(Debug, Default)]
pub struct InMemoryDictionary {
    forward: HashMap<Term, Id>,
    backward: HashMap<Id, Term>,
    counter: IdCounter,
}

impl InMemoryDictionary {
    pub fn new() -> Self {
        InMemoryDictionary {
            forward: HashMap::new(),
            backward: HashMap::new(),
            counter: IdCounter::new(),
        }
    }

    /// Assigns `term` a fresh identifier if it doesn't already have one.
    pub fn intern(&mut self, term: Term) -> Id {
        if let Some(&id) = self.forward.get(&term) {
            return id;
        }
        let id = self.counter.next_id();
        self.forward.insert(term.clone(), id);
        self.backward.insert(id, term);
        id
    }
}

impl Dictionary for InMemoryDictionary {
    fn lookup(&self, term: &Term) -> Result<Option<Id>, KvError> {
        Ok(self.forward.get(term).copied())
    }

    fn resolve(&self, id: Id) -> Result<Option<Term>, KvError> {
        Ok(self.backward.get(&id).cloned())
    }
}
