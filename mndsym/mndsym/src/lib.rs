//! Reconstructs C declarations from PlayStation 1 MND/SYM debug symbols.
//!
//! [`SymReader`] runs the whole pipeline: the tag stream is decoded by
//! `mndsym-tags`, a [`Builder`] turns the records into one
//! [`Overlay`](mndsym_core::Overlay) per overlay id, then each overlay is
//! deduplicated ([`dedup_overlay`]) and its colliding names are made unique
//! ([`uniquify_overlay`]). The result prints back as C through
//! [`DefinitionWriter`](mndsym_core::DefinitionWriter).
//!
//! Deduplication compares field types shallowly, except for scalar base
//! types: two otherwise identical structs differing only in `int` versus
//! `unsigned int` fields stay separate.

mod builder;
mod dedup;
mod error;
mod lines;
mod options;
mod reader;
mod resolver;
mod typecode;
mod uniquify;

pub use builder::Builder;
pub use dedup::{DedupStats, dedup_overlay, enums_equal, records_equal, typedefs_equal};
pub use error::SymReaderError;
pub use mndsym_core as core;
pub use mndsym_tags as tags;
pub use options::ReadOptions;
pub use reader::{SymReader, SymReaderBuilder, SymbolTable};
pub use resolver::sanitize_name;
pub use uniquify::uniquify_overlay;
