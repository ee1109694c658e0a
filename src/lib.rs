#![doc = include_str!("../README.md")]

pub mod builder;
pub mod constraint;
pub mod cursor;
pub mod dictionary;
pub mod hexastore;
pub mod id;
pub mod kv;
pub mod provenance;
pub mod query;
pub mod scorer;
pub mod sorter;
pub mod term;
pub mod test;
pub mod variable;

pub use builder::{build, BuildError, ConstraintGraph};
pub use cursor::{Cursor, QueryError};
pub use dictionary::Dictionary;
pub use id::Id;
pub use kv::{KvError, KvStore};
pub use provenance::{GraphCheck, Source};
pub use term::{PatternQuad, PatternTerm, Term};
