//! Little-endian tag-stream decoding.

use bytes::Buf;
use mndsym_core::FormatError;

use crate::{
    header::{HEADER_LEN, SIGNATURE, SymHeader},
    record::{Class, Def, FuncStart, Record, RecordBody, TagKind, TypeCode},
};

/// A decoded symbol file: header and records in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct SymFile {
    pub header: SymHeader,
    pub records: Vec<Record>,
}

/// Decode a complete symbol file.
///
/// Decoding stops cleanly only at a record boundary; a record cut short by
/// the end of input is an error.
pub fn decode(data: &[u8]) -> Result<SymFile, FormatError> {
    let mut d = Decoder::new(data);
    let header = d.read_header()?;
    let mut records = Vec::new();
    while d.buf.has_remaining() {
        let record = d.read_record(records.len())?;
        records.push(record);
    }
    Ok(SymFile { header, records })
}

struct Decoder<'a> {
    buf: &'a [u8],
    initial_len: usize,
}

/// Position of the record being decoded, for error reporting.
#[derive(Clone, Copy)]
struct At {
    offset: usize,
    index: usize,
}

impl At {
    fn err(self, detail: impl Into<String>) -> FormatError {
        FormatError::new(self.offset, self.index, detail)
    }

    fn truncated(self, what: &str) -> FormatError {
        self.err(format!("unexpected end of input while reading {what}"))
    }
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            initial_len: buf.len(),
        }
    }

    fn current_offset(&self) -> usize {
        self.initial_len - self.buf.remaining()
    }

    fn read_header(&mut self) -> Result<SymHeader, FormatError> {
        let at = At {
            offset: 0,
            index: 0,
        };
        if self.buf.remaining() < HEADER_LEN {
            return Err(at.err(format!(
                "header needs {HEADER_LEN} bytes, got {}",
                self.buf.remaining()
            )));
        }
        let mut signature = [0u8; 3];
        self.buf.copy_to_slice(&mut signature);
        if &signature != SIGNATURE {
            return Err(at.err(format!(
                "bad signature {:?}, expected \"MND\"",
                String::from_utf8_lossy(&signature)
            )));
        }
        let version = self.buf.get_u8();
        let target_unit = self.buf.get_u32_le();
        Ok(SymHeader {
            version,
            target_unit,
        })
    }

    fn read_record(&mut self, index: usize) -> Result<Record, FormatError> {
        let at = At {
            offset: self.current_offset(),
            index,
        };
        let value = self.u32(at, "record value")?;
        let code = self.u8(at, "record kind")?;
        let kind = TagKind::from_u8(code)
            .ok_or_else(|| at.err(format!("unknown record kind 0x{code:02X}")))?;

        let body = match kind {
            TagKind::Name1 => RecordBody::Name1(self.string(at, "symbol name")?),
            TagKind::Name2 => RecordBody::Name2(self.string(at, "symbol name")?),
            TagKind::IncLine => RecordBody::IncLine,
            TagKind::IncLineByte => RecordBody::IncLineByte(self.u8(at, "line increment")?),
            TagKind::IncLineWord => RecordBody::IncLineWord(self.u16(at, "line increment")?),
            TagKind::SetLine => RecordBody::SetLine(self.u32(at, "line number")?),
            TagKind::SetLineWithPath => RecordBody::SetLineWithPath {
                line: self.u32(at, "line number")?,
                path: self.string(at, "source path")?,
            },
            TagKind::EndLine => RecordBody::EndLine,
            TagKind::FuncStart => RecordBody::FuncStart(FuncStart {
                fp: self.u16(at, "frame register")?,
                fsize: self.u32(at, "frame size")?,
                ret_reg: self.u16(at, "return register")?,
                mask: self.u32(at, "register mask")?,
                mask_offset: self.i32(at, "register mask offset")?,
                line: self.u32(at, "line number")?,
                path: self.string(at, "source path")?,
                name: self.string(at, "function name")?,
            }),
            TagKind::FuncEnd => RecordBody::FuncEnd {
                line: self.u32(at, "line number")?,
            },
            TagKind::BlockStart => RecordBody::BlockStart {
                line: self.u32(at, "line number")?,
            },
            TagKind::BlockEnd => RecordBody::BlockEnd {
                line: self.u32(at, "line number")?,
            },
            TagKind::Def => {
                let class = Class::from_u16(self.u16(at, "storage class")?);
                let ty = TypeCode(self.u16(at, "type word")?);
                let size = self.u32(at, "size")?;
                let name = self.string(at, "definition name")?;
                RecordBody::Def(Def {
                    class,
                    ty,
                    size,
                    dims: Vec::new(),
                    tag: String::new(),
                    name,
                })
            }
            TagKind::Def2 => {
                let class = Class::from_u16(self.u16(at, "storage class")?);
                let ty = TypeCode(self.u16(at, "type word")?);
                let size = self.u32(at, "size")?;
                let ndims = self.u16(at, "dimension count")?;
                let dims = (0..ndims)
                    .map(|_| self.u32(at, "array dimension"))
                    .collect::<Result<Vec<_>, _>>()?;
                let tag = self.string(at, "tag")?;
                let name = self.string(at, "definition name")?;
                RecordBody::Def2(Def {
                    class,
                    ty,
                    size,
                    dims,
                    tag,
                    name,
                })
            }
            TagKind::Overlay => RecordBody::Overlay {
                length: self.u32(at, "overlay length")?,
                id: self.u32(at, "overlay id")?,
            },
            TagKind::SetOverlay => RecordBody::SetOverlay,
        };

        Ok(Record {
            offset: at.offset,
            value,
            body,
        })
    }

    fn u8(&mut self, at: At, what: &str) -> Result<u8, FormatError> {
        self.buf.try_get_u8().map_err(|_| at.truncated(what))
    }

    fn u16(&mut self, at: At, what: &str) -> Result<u16, FormatError> {
        self.buf.try_get_u16_le().map_err(|_| at.truncated(what))
    }

    fn u32(&mut self, at: At, what: &str) -> Result<u32, FormatError> {
        self.buf.try_get_u32_le().map_err(|_| at.truncated(what))
    }

    fn i32(&mut self, at: At, what: &str) -> Result<i32, FormatError> {
        self.buf.try_get_i32_le().map_err(|_| at.truncated(what))
    }

    /// A `u8` length followed by that many bytes.
    fn string(&mut self, at: At, what: &str) -> Result<String, FormatError> {
        let len = usize::from(self.u8(at, what)?);
        if self.buf.remaining() < len {
            return Err(at.truncated(what));
        }
        let buf: &'a [u8] = self.buf;
        let (text, rest) = buf.split_at(len);
        self.buf = rest;
        Ok(String::from_utf8_lossy(text).into_owned())
    }
}
