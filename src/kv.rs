//! The ordered key/value store this crate reads from.
//!
//! Writing the hexastore's twelve entries per triple, and everything
//! upstream of that (ingest, JSON-LD, content-addressing), is out of scope
//! here — this module only defines the read-only interface the query path
//! consumes, plus a small in-memory implementation used by this crate's own
//! tests.

use std::collections::BTreeMap;
use std::fmt;

/// An error surfaced by the KV store. "Key not found" at a seek is *not*
/// represented here — per spec.md §7.3 it is an empty stream, not an error.
#[derive(Debug)]
pub enum KvError {
    /// The underlying store failed; `operation` names what was attempted
    /// (e.g. "scan_prefix", "get") so the failure can be traced back to a
    /// specific read.
    Backend {
        operation: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvError::Backend { operation, source } => {
                write!(f, "KV store failed during {}: {}", operation, source)
            }
        }
    }
}

impl std::error::Error for KvError {}

impl KvError {
    pub fn backend(operation: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        KvError::Backend {
            operation,
            source: Box::new(source),
        }
    }
}

/// A read-only, ordered byte-keyed store.
///
/// Implementations only need to support prefix scans and point reads over a
/// single, stable snapshot (see spec.md §5: "a single read snapshot of the
/// KV store"). Keys are compared byte-lexicographically, which is why every
/// identifier this crate encodes into a key is big-endian (see [`crate::id`]).
pub trait KvStore {
    /// All entries whose key starts with `prefix`, ascending by key.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError>;

    /// The value stored at `key`, or `None` if absent ("key not found").
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError>;
}

/// A simple in-memory [`KvStore`] backed by a `BTreeMap`, used by this
/// crate's tests and as a reference store for demos. Populating it models
/// the (out of scope) ingest path: the query engine never writes through
/// [`KvStore`] itself, only through this test-only builder.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKv {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        InMemoryKv {
            entries: BTreeMap::new(),
        }
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    /// Adds `delta` to the stored count at `key`, initializing to `delta`
    /// if absent.
    pub fn add_count(&mut self, key: Vec<u8>, delta: u64) {
        let current = self
            .entries
            .get(&key)
            .map(|bytes| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                u64::from_be_bytes(buf)
            })
            .unwrap_or(0);
        self.entries.insert(key, (current + delta).to_be_bytes().to_vec());
    }
}

impl KvStore for InMemoryKv {
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError> {
        Ok(self
            .entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.entries.get(key).cloned())
    }
}
