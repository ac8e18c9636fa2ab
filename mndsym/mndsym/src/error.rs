//! Error types for the symbol reader.

use mndsym_core::{FormatError, InconsistencyError, SymError};

/// Errors produced by [`SymReader`](crate::SymReader).
#[derive(Debug, thiserror::Error)]
pub enum SymReaderError {
    /// I/O error while opening or memory-mapping a file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The file could not be decoded or describes inconsistent symbols.
    #[error(transparent)]
    Sym(#[from] SymError),
}

impl From<FormatError> for SymReaderError {
    fn from(err: FormatError) -> Self {
        SymReaderError::Sym(err.into())
    }
}

impl From<InconsistencyError> for SymReaderError {
    fn from(err: InconsistencyError) -> Self {
        SymReaderError::Sym(err.into())
    }
}
