//! Decoded tag-stream records.

use std::fmt::{self, Display, Formatter};

/// One record of the tag stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Byte offset of the record in the file.
    pub offset: usize,
    /// Address or value field; its meaning depends on the record kind.
    pub value: u32,
    pub body: RecordBody,
}

impl Record {
    pub fn kind(&self) -> TagKind {
        self.body.kind()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordBody {
    /// Symbol name at `value`.
    Name1(String),
    /// Symbol name at `value`, second flavour emitted by the linker.
    Name2(String),
    IncLine,
    IncLineByte(u8),
    IncLineWord(u16),
    SetLine(u32),
    SetLineWithPath {
        line: u32,
        path: String,
    },
    EndLine,
    FuncStart(FuncStart),
    FuncEnd {
        line: u32,
    },
    BlockStart {
        line: u32,
    },
    BlockEnd {
        line: u32,
    },
    Def(Def),
    /// Like [`RecordBody::Def`], with array dimensions and a tag.
    Def2(Def),
    /// Overlay description; the load address is in `value`.
    Overlay {
        length: u32,
        id: u32,
    },
    /// Switch to the overlay whose id is in `value`.
    SetOverlay,
}

impl RecordBody {
    pub fn kind(&self) -> TagKind {
        match self {
            RecordBody::Name1(_) => TagKind::Name1,
            RecordBody::Name2(_) => TagKind::Name2,
            RecordBody::IncLine => TagKind::IncLine,
            RecordBody::IncLineByte(_) => TagKind::IncLineByte,
            RecordBody::IncLineWord(_) => TagKind::IncLineWord,
            RecordBody::SetLine(_) => TagKind::SetLine,
            RecordBody::SetLineWithPath { .. } => TagKind::SetLineWithPath,
            RecordBody::EndLine => TagKind::EndLine,
            RecordBody::FuncStart(_) => TagKind::FuncStart,
            RecordBody::FuncEnd { .. } => TagKind::FuncEnd,
            RecordBody::BlockStart { .. } => TagKind::BlockStart,
            RecordBody::BlockEnd { .. } => TagKind::BlockEnd,
            RecordBody::Def(_) => TagKind::Def,
            RecordBody::Def2(_) => TagKind::Def2,
            RecordBody::Overlay { .. } => TagKind::Overlay,
            RecordBody::SetOverlay => TagKind::SetOverlay,
        }
    }

    /// Line-number records, consumed by the line table decoder.
    pub fn is_line(&self) -> bool {
        matches!(
            self,
            RecordBody::IncLine
                | RecordBody::IncLineByte(_)
                | RecordBody::IncLineWord(_)
                | RecordBody::SetLine(_)
                | RecordBody::SetLineWithPath { .. }
                | RecordBody::EndLine
        )
    }
}

/// Start of a function definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncStart {
    /// Frame pointer register.
    pub fp: u16,
    /// Frame size.
    pub fsize: u32,
    /// Return address register.
    pub ret_reg: u16,
    /// Saved register mask.
    pub mask: u32,
    pub mask_offset: i32,
    pub line: u32,
    pub path: String,
    pub name: String,
}

/// A COFF-style symbol definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Def {
    pub class: Class,
    pub ty: TypeCode,
    pub size: u32,
    /// Array dimensions; always empty for [`RecordBody::Def`].
    pub dims: Vec<u32>,
    /// Aggregate tag; always empty for [`RecordBody::Def`].
    pub tag: String,
    pub name: String,
}

/// Record kind byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagKind {
    Name1 = 0x01,
    Name2 = 0x02,
    IncLine = 0x80,
    IncLineByte = 0x82,
    IncLineWord = 0x84,
    SetLine = 0x86,
    SetLineWithPath = 0x88,
    EndLine = 0x8A,
    FuncStart = 0x8C,
    FuncEnd = 0x8E,
    BlockStart = 0x90,
    BlockEnd = 0x92,
    Def = 0x94,
    Def2 = 0x96,
    Overlay = 0x98,
    SetOverlay = 0x9A,
}

impl TagKind {
    pub fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            0x01 => TagKind::Name1,
            0x02 => TagKind::Name2,
            0x80 => TagKind::IncLine,
            0x82 => TagKind::IncLineByte,
            0x84 => TagKind::IncLineWord,
            0x86 => TagKind::SetLine,
            0x88 => TagKind::SetLineWithPath,
            0x8A => TagKind::EndLine,
            0x8C => TagKind::FuncStart,
            0x8E => TagKind::FuncEnd,
            0x90 => TagKind::BlockStart,
            0x92 => TagKind::BlockEnd,
            0x94 => TagKind::Def,
            0x96 => TagKind::Def2,
            0x98 => TagKind::Overlay,
            0x9A => TagKind::SetOverlay,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// COFF storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Null,
    Auto,
    External,
    Static,
    Register,
    ExternalDef,
    Label,
    UndefinedLabel,
    StructMember,
    Argument,
    StructTag,
    UnionMember,
    UnionTag,
    Typedef,
    UndefinedStatic,
    EnumTag,
    EnumMember,
    RegisterParam,
    Bitfield,
    Block,
    Function,
    EndOfStruct,
    File,
    Line,
    Alias,
    Hidden,
    Other(u16),
}

impl Class {
    pub fn from_u16(code: u16) -> Self {
        match code {
            0 => Class::Null,
            1 => Class::Auto,
            2 => Class::External,
            3 => Class::Static,
            4 => Class::Register,
            5 => Class::ExternalDef,
            6 => Class::Label,
            7 => Class::UndefinedLabel,
            8 => Class::StructMember,
            9 => Class::Argument,
            10 => Class::StructTag,
            11 => Class::UnionMember,
            12 => Class::UnionTag,
            13 => Class::Typedef,
            14 => Class::UndefinedStatic,
            15 => Class::EnumTag,
            16 => Class::EnumMember,
            17 => Class::RegisterParam,
            18 => Class::Bitfield,
            100 => Class::Block,
            101 => Class::Function,
            102 => Class::EndOfStruct,
            103 => Class::File,
            104 => Class::Line,
            105 => Class::Alias,
            106 => Class::Hidden,
            other => Class::Other(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Class::Null => 0,
            Class::Auto => 1,
            Class::External => 2,
            Class::Static => 3,
            Class::Register => 4,
            Class::ExternalDef => 5,
            Class::Label => 6,
            Class::UndefinedLabel => 7,
            Class::StructMember => 8,
            Class::Argument => 9,
            Class::StructTag => 10,
            Class::UnionMember => 11,
            Class::UnionTag => 12,
            Class::Typedef => 13,
            Class::UndefinedStatic => 14,
            Class::EnumTag => 15,
            Class::EnumMember => 16,
            Class::RegisterParam => 17,
            Class::Bitfield => 18,
            Class::Block => 100,
            Class::Function => 101,
            Class::EndOfStruct => 102,
            Class::File => 103,
            Class::Line => 104,
            Class::Alias => 105,
            Class::Hidden => 106,
            Class::Other(code) => code,
        }
    }

    /// Short mnemonic as printed by DUMPSYM.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Class::Null => "NULL",
            Class::Auto => "AUTO",
            Class::External => "EXT",
            Class::Static => "STAT",
            Class::Register => "REG",
            Class::ExternalDef => "EXTDEF",
            Class::Label => "LABEL",
            Class::UndefinedLabel => "ULABEL",
            Class::StructMember => "MOS",
            Class::Argument => "ARG",
            Class::StructTag => "STRTAG",
            Class::UnionMember => "MOU",
            Class::UnionTag => "UNTAG",
            Class::Typedef => "TPDEF",
            Class::UndefinedStatic => "USTATIC",
            Class::EnumTag => "ENTAG",
            Class::EnumMember => "MOE",
            Class::RegisterParam => "REGPARM",
            Class::Bitfield => "FIELD",
            Class::Block => "BLOCK",
            Class::Function => "FCN",
            Class::EndOfStruct => "EOS",
            Class::File => "FILE",
            Class::Line => "LINE",
            Class::Alias => "ALIAS",
            Class::Hidden => "HIDDEN",
            Class::Other(_) => "?",
        }
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Class::Other(code) => write!(f, "?{code}"),
            class => f.write_str(class.mnemonic()),
        }
    }
}

/// Base type of a [`TypeCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseCode {
    Null,
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Struct,
    Union,
    Enum,
    EnumMember,
    UChar,
    UShort,
    UInt,
    ULong,
}

impl BaseCode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BaseCode::Null => "NULL",
            BaseCode::Void => "VOID",
            BaseCode::Char => "CHAR",
            BaseCode::Short => "SHORT",
            BaseCode::Int => "INT",
            BaseCode::Long => "LONG",
            BaseCode::Float => "FLOAT",
            BaseCode::Double => "DOUBLE",
            BaseCode::Struct => "STRUCT",
            BaseCode::Union => "UNION",
            BaseCode::Enum => "ENUM",
            BaseCode::EnumMember => "MOE",
            BaseCode::UChar => "UCHAR",
            BaseCode::UShort => "USHORT",
            BaseCode::UInt => "UINT",
            BaseCode::ULong => "ULONG",
        }
    }
}

/// Derived-type modifier of a [`TypeCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Pointer,
    Function,
    Array,
}

impl Modifier {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Modifier::Pointer => "PTR",
            Modifier::Function => "FCN",
            Modifier::Array => "ARY",
        }
    }
}

/// Maximum number of derived-type modifiers in a type word.
pub const MAX_MODIFIERS: usize = 6;

/// COFF type word: a base type in the low four bits and up to six 2-bit
/// derived-type modifiers above it, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeCode(pub u16);

impl TypeCode {
    pub fn base(self) -> BaseCode {
        match self.0 & 0xF {
            0 => BaseCode::Null,
            1 => BaseCode::Void,
            2 => BaseCode::Char,
            3 => BaseCode::Short,
            4 => BaseCode::Int,
            5 => BaseCode::Long,
            6 => BaseCode::Float,
            7 => BaseCode::Double,
            8 => BaseCode::Struct,
            9 => BaseCode::Union,
            10 => BaseCode::Enum,
            11 => BaseCode::EnumMember,
            12 => BaseCode::UChar,
            13 => BaseCode::UShort,
            14 => BaseCode::UInt,
            _ => BaseCode::ULong,
        }
    }

    /// Modifiers, outermost first. Stops at the first empty slot.
    pub fn mods(self) -> Vec<Modifier> {
        (0..MAX_MODIFIERS)
            .map(|i| (self.0 >> (4 + 2 * i)) & 0x3)
            .take_while(|&bits| bits != 0)
            .map(|bits| match bits {
                1 => Modifier::Pointer,
                2 => Modifier::Function,
                _ => Modifier::Array,
            })
            .collect()
    }

    /// Build a type word from a base code and modifiers, outermost first.
    pub fn compose(base: u16, mods: &[Modifier]) -> Self {
        let word = mods
            .iter()
            .take(MAX_MODIFIERS)
            .enumerate()
            .fold(base & 0xF, |word, (i, m)| {
                let bits = match m {
                    Modifier::Pointer => 1,
                    Modifier::Function => 2,
                    Modifier::Array => 3,
                };
                word | (bits << (4 + 2 * i))
            });
        TypeCode(word)
    }
}

impl Display for TypeCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for m in self.mods() {
            write!(f, "{} ", m.mnemonic())?;
        }
        f.write_str(self.base().mnemonic())
    }
}
