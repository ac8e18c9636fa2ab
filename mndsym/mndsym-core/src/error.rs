//! Error types shared by the decoding and building layers.

/// The byte stream does not follow the MND/SYM record layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("format error at offset 0x{offset:x} (record {index}): {detail}")]
pub struct FormatError {
    /// Byte offset of the record (or header) being decoded.
    pub offset: usize,
    /// Zero-based index of the record being decoded.
    pub index: usize,
    pub detail: String,
}

impl FormatError {
    pub fn new(offset: usize, index: usize, detail: impl Into<String>) -> Self {
        Self {
            offset,
            index,
            detail: detail.into(),
        }
    }
}

/// The records decode fine but describe something impossible, such as a
/// struct redefined with another size or a function body that never ends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("inconsistent symbols at offset 0x{offset:x} (record {index}, '{name}'): {detail}")]
pub struct InconsistencyError {
    pub offset: usize,
    pub index: usize,
    /// Declaration, tag or function involved; empty when there is none.
    pub name: String,
    pub detail: String,
}

impl InconsistencyError {
    pub fn new(
        offset: usize,
        index: usize,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            offset,
            index,
            name: name.into(),
            detail: detail.into(),
        }
    }
}

/// Any fatal error of the symbol pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Inconsistency(#[from] InconsistencyError),
}
