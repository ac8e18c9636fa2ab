//! Variable and function declarations.

use crate::types::{FunctionType, Type};

/// C storage class of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Auto,
    Extern,
    Static,
    Register,
    Typedef,
}

impl StorageClass {
    pub fn keyword(self) -> &'static str {
        match self {
            StorageClass::Auto => "auto",
            StorageClass::Extern => "extern",
            StorageClass::Static => "static",
            StorageClass::Register => "register",
            StorageClass::Typedef => "typedef",
        }
    }
}

/// A variable, parameter, local or typedef declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    /// Address, frame offset or register number depending on the storage class.
    pub addr: u32,
    pub size: u32,
    /// `None` for arguments and labels.
    pub class: Option<StorageClass>,
    pub ty: Type,
    pub name: String,
}

/// A lexical block inside a function body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Start line, relative to the function.
    pub line_start: u32,
    /// End line, relative to the function.
    pub line_end: u32,
    pub locals: Vec<VarDecl>,
    /// Nesting depth; `0` for the outermost block of the function.
    pub depth: usize,
    /// Set once the matching block end has been seen.
    pub closed: bool,
}

impl Block {
    /// Append a local unless one with the same name is already present.
    pub fn add_local(&mut self, local: VarDecl) -> bool {
        if self.locals.iter().any(|v| v.name == local.name) {
            return false;
        }
        self.locals.push(local);
        true
    }
}

/// A function declaration, optionally with the body scope information of its
/// definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    /// Source file of the definition; empty for prototypes.
    pub path: String,
    pub addr: u32,
    pub size: u32,
    pub line_start: u32,
    pub line_end: u32,
    pub name: String,
    pub signature: FunctionType,
    /// Blocks in order of appearance; nesting is given by [`Block::depth`].
    pub blocks: Vec<Block>,
}

impl FuncDecl {
    pub fn new(name: impl Into<String>, addr: u32, size: u32, signature: FunctionType) -> Self {
        Self {
            path: String::new(),
            addr,
            size,
            line_start: 0,
            line_end: 0,
            name: name.into(),
            signature,
            blocks: Vec::new(),
        }
    }

    /// Whether a function body span has already been recorded.
    pub fn has_body(&self) -> bool {
        self.line_start != 0 || !self.path.is_empty()
    }
}
