//! Decoder for the PlayStation 1 MND/SYM debug symbol tag stream.
//!
//! [`decode`] turns the raw bytes into a [`SymFile`]: the header and the
//! ordered list of [`Record`]s. Record order carries meaning (line runs,
//! function bodies, aggregate member runs), so nothing is interpreted here;
//! building the type graph is left to the `mndsym` crate. `SymFile` also
//! implements `Display` as a DUMPSYM-style listing.

mod decoder;
mod header;
mod listing;
mod record;

pub use decoder::{SymFile, decode};
pub use header::{HEADER_LEN, SIGNATURE, SymHeader};
pub use record::{
    BaseCode, Class, Def, FuncStart, MAX_MODIFIERS, Modifier, Record, RecordBody, TagKind,
    TypeCode,
};
