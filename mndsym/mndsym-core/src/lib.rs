//! C type and declaration model for PlayStation 1 MND/SYM debug symbols.
//!
//! This crate holds the per-overlay type graph ([`Overlay`], [`TypeArena`],
//! [`Type`]), the shared error types, and the printers that turn the graph
//! back into C ([`Declarator`], [`DefinitionWriter`]). It knows nothing about
//! the binary format; see `mndsym-tags` for decoding and `mndsym` for the
//! full pipeline.

mod decl;
mod declarator;
mod definition;
mod error;
mod overlay;
mod types;

pub use decl::{Block, FuncDecl, StorageClass, VarDecl};
pub use declarator::{Declarator, indent};
pub use definition::DefinitionWriter;
pub use error::{FormatError, InconsistencyError, SymError};
pub use overlay::{Line, Overlay, Symbol, TypeArena};
pub use types::{
    BaseKind, EnumId, EnumMember, EnumType, Field, FunctionType, POINTER_SIZE, RecordId,
    RecordKind, RecordType, Tag, Type, TypeCategory, TypedefId,
};
