//! File header.

/// Magic bytes at the start of every symbol file.
pub const SIGNATURE: &[u8; 3] = b"MND";

/// Size of the header in bytes.
pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymHeader {
    pub version: u8,
    pub target_unit: u32,
}
