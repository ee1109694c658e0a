//! Per-triple provenance ("sources": dataset hash, graph name, quad index —
//! spec.md §3, "Triple keys") and the machinery for checking a pattern's
//! optional ground graph terms against it.
//!
//! Decoding a triple's full source list is the one place this crate looks
//! past hexastore keys into their values; everything else about ingest
//! (writing it, content-addressing the dataset) is out of scope.

use crate::dictionary::Dictionary;
use crate::hexastore::{Hexastore, Permutation};
use crate::id::Id;
use crate::kv::{KvError, KvStore};
use crate::term::DatasetId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub dataset: DatasetId,
    pub graph: Option<String>,
    pub quad_index: u64,
}

pub fn encode_sources(sources: &[Source]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(sources.len() as u32).to_be_bytes());
    for source in sources {
        out.extend_from_slice(&source.dataset.0);
        match &source.graph {
            Some(graph) => {
                out.extend_from_slice(&(graph.len() as u32).to_be_bytes());
                out.extend_from_slice(graph.as_bytes());
            }
            None => out.extend_from_slice(&u32::MAX.to_be_bytes()),
        }
        out.extend_from_slice(&source.quad_index.to_be_bytes());
    }
    out
}

pub fn decode_sources(bytes: &[u8]) -> Vec<Source> {
    if bytes.len() < 4 {
        return Vec::new();
    }
    let mut cursor = 4;
    let count = u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let mut sources = Vec::with_capacity(count);
    for _ in 0..count {
        if bytes.len() < cursor + 32 + 4 {
            break;
        }
        let mut dataset_bytes = [0u8; 32];
        dataset_bytes.copy_from_slice(&bytes[cursor..cursor + 32]);
        cursor += 32;

        let len = u32::from_be_bytes(bytes[cursor..cursor + 4].try_into().unwrap());
        cursor += 4;
        let graph = if len == u32::MAX {
            None
        } else {
            let len = len as usize;
            if bytes.len() < cursor + len {
                break;
            }
            let graph = String::from_utf8_lossy(&bytes[cursor..cursor + len]).into_owned();
            cursor += len;
            Some(graph)
        };

        if bytes.len() < cursor + 8 {
            break;
        }
        let quad_index = u64::from_be_bytes(bytes[cursor..cursor + 8].try_into().unwrap());
        cursor += 8;

        sources.push(Source {
            dataset: DatasetId::from_bytes(dataset_bytes),
            graph,
            quad_index,
        });
    }
    sources
}

impl<'a, K: KvStore + ?Sized> Hexastore<'a, K> {
    /// The full source list recorded for the ground triple `(s, p, o)`.
    pub fn sources(&self, s: Id, p: Id, o: Id) -> Result<Vec<Source>, KvError> {
        let key = crate::hexastore::spo_key(s, p, o);
        Ok(self
            .raw_get(&key)?
            .map(|bytes| decode_sources(&bytes))
            .unwrap_or_default())
    }

    fn raw_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        self.kv_ref().get(key)
    }
}

/// Which side of a quad's term a resolvable value comes from: a ground
/// identifier fixed at build time, or a variable's binding at solve time.
#[derive(Clone, Debug)]
pub enum Resolvable {
    Ground(Id),
    Variable(String),
}

/// What a pattern quad requires of the graph its matching triple came from.
#[derive(Clone, Debug)]
pub enum GraphExpectation {
    None,
    Ground(String),
    /// Only satisfiable when `name` is also bound via some subject/
    /// predicate/object position elsewhere in the pattern — a graph-only
    /// variable has no hexastore keyspace to be driven by (see module docs
    /// and DESIGN.md).
    Variable(String),
}

/// One pattern quad's graph-membership obligation, checked once a full
/// solution is assigned.
#[derive(Clone, Debug)]
pub struct GraphCheck {
    pub subject: Resolvable,
    pub predicate: Resolvable,
    pub object: Resolvable,
    pub graph: GraphExpectation,
    pub permutation: Permutation,
}

impl Resolvable {
    fn current(&self, binding: &impl Fn(&str) -> Option<Id>) -> Option<Id> {
        match self {
            Resolvable::Ground(id) => Some(*id),
            Resolvable::Variable(name) => binding(name),
        }
    }
}

impl GraphCheck {
    pub fn is_required(&self) -> bool {
        !matches!(self.graph, GraphExpectation::None)
    }

    /// Verifies this quad's graph obligation against a fully-resolved
    /// triple. `binding` resolves a variable name to its currently-assigned
    /// identifier; it is only ever consulted for variables, never for a
    /// ground [`Resolvable`].
    pub fn evaluate<K, D>(&self, hx: &Hexastore<K>, dict: &D, binding: impl Fn(&str) -> Option<Id>) -> Result<bool, KvError>
    where
        K: KvStore + ?Sized,
        D: Dictionary,
    {
        if !self.is_required() {
            return Ok(true);
        }
        let (Some(s), Some(p), Some(o)) = (
            self.subject.current(&binding),
            self.predicate.current(&binding),
            self.object.current(&binding),
        ) else {
            return Ok(false);
        };
        let sources = hx.sources(s, p, o)?;
        match &self.graph {
            GraphExpectation::None => Ok(true),
            GraphExpectation::Ground(name) => Ok(sources.iter().any(|src| src.graph.as_deref() == Some(name.as_str()))),
            GraphExpectation::Variable(var_name) => {
                let Some(id) = binding(var_name) else {
                    return Ok(false);
                };
                let Some(term) = dict.resolve(id)? else {
                    return Ok(false);
                };
                let text = term.text().to_string();
                Ok(sources.iter().any(|src| src.graph.as_deref() == Some(text.as_str())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_round_trips_through_encoding() {
        let sources = vec![
            Source {
                dataset: DatasetId::of(b"ds-a"),
                graph: Some("http://example.com/g1".to_string()),
                quad_index: 3,
            },
            Source {
                dataset: DatasetId::of(b"ds-b"),
                graph: None,
                quad_index: 0,
            },
        ];
        let bytes = encode_sources(&sources);
        assert_eq!(decode_sources(&bytes), sources);
    }

    #[test]
    fn decode_truncated_bytes_is_empty() {
        assert!(decode_sources(&[1, 2]).is_empty());
    }
}
