//! C type model.
//!
//! Scalar and derived types ([`Type::Pointer`], [`Type::Array`],
//! [`Type::Function`]) are plain owned values. Aggregates (struct, union, enum)
//! and typedefs are shared between many use sites, so they live in the
//! overlay's [`TypeArena`](crate::TypeArena) and are referenced by handle.

use std::fmt::{self, Display, Formatter};

use crate::decl::VarDecl;

/// Scalar base types known to the PlayStation 1 toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    UChar,
    UShort,
    UInt,
    ULong,
}

impl BaseKind {
    /// C spelling of the type.
    pub fn c_name(self) -> &'static str {
        match self {
            BaseKind::Void => "void",
            BaseKind::Char => "char",
            BaseKind::Short => "short",
            BaseKind::Int => "int",
            BaseKind::Long => "long",
            BaseKind::Float => "float",
            BaseKind::Double => "double",
            BaseKind::UChar => "unsigned char",
            BaseKind::UShort => "unsigned short",
            BaseKind::UInt => "unsigned int",
            BaseKind::ULong => "unsigned long",
        }
    }

    /// Size in bytes on the R3000 target, `None` for `void`.
    pub fn size(self) -> Option<u32> {
        match self {
            BaseKind::Void => None,
            BaseKind::Char | BaseKind::UChar => Some(1),
            BaseKind::Short | BaseKind::UShort => Some(2),
            BaseKind::Int
            | BaseKind::Long
            | BaseKind::Float
            | BaseKind::UInt
            | BaseKind::ULong => Some(4),
            BaseKind::Double => Some(8),
        }
    }
}

/// Width of a data pointer on the target.
pub const POINTER_SIZE: u32 = 4;

/// Handle of a struct or union in a [`TypeArena`](crate::TypeArena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) usize);

/// Handle of an enum in a [`TypeArena`](crate::TypeArena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub(crate) usize);

/// Handle of a typedef declaration in a [`TypeArena`](crate::TypeArena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypedefId(pub(crate) usize);

/// A C type.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Base(BaseKind),
    Pointer(Box<Type>),
    /// `len == 0` renders as an unsized array (`name[]`).
    Array {
        elem: Box<Type>,
        len: u32,
    },
    Function(FunctionType),
    Struct(RecordId),
    Union(RecordId),
    Enum(EnumId),
    Typedef(TypedefId),
}

impl Type {
    pub fn pointer_to(elem: Type) -> Self {
        Type::Pointer(Box::new(elem))
    }

    pub fn array_of(elem: Type, len: u32) -> Self {
        Type::Array {
            elem: Box::new(elem),
            len,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// Shallow classification used by structural comparisons.
    pub fn category(&self) -> TypeCategory {
        match self {
            Type::Base(kind) => TypeCategory::Base(*kind),
            Type::Pointer(_) => TypeCategory::Pointer,
            Type::Array { .. } => TypeCategory::Array,
            Type::Function(_) => TypeCategory::Function,
            Type::Struct(_) => TypeCategory::Struct,
            Type::Union(_) => TypeCategory::Union,
            Type::Enum(_) => TypeCategory::Enum,
            Type::Typedef(_) => TypeCategory::Typedef,
        }
    }

    /// Visit every nested type slot, outermost first, including function
    /// return types and parameter types.
    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut Type)) {
        f(self);
        match self {
            Type::Pointer(elem) | Type::Array { elem, .. } => elem.for_each_mut(f),
            Type::Function(func) => func.for_each_mut(f),
            _ => {}
        }
    }
}

/// Variant of a [`Type`] with base kinds kept apart and everything else
/// compared by shape only (a pointer is a pointer regardless of pointee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Base(BaseKind),
    Pointer,
    Array,
    Function,
    Struct,
    Union,
    Enum,
    Typedef,
}

/// A function type: return type, parameters in declaration order, and
/// whether trailing arguments are variadic.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub ret: Box<Type>,
    pub params: Vec<VarDecl>,
    pub variadic: bool,
}

impl FunctionType {
    pub fn new(ret: Type) -> Self {
        Self {
            ret: Box::new(ret),
            params: Vec::new(),
            variadic: false,
        }
    }

    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut Type)) {
        self.ret.for_each_mut(f);
        for param in &mut self.params {
            param.ty.for_each_mut(f);
        }
    }

    /// Append a parameter unless one with the same name is already present.
    pub fn add_param(&mut self, param: VarDecl) -> bool {
        if self.params.iter().any(|p| p.name == param.name) {
            return false;
        }
        self.params.push(param);
        true
    }
}

/// Aggregate tag name.
///
/// The compiler synthesizes `.<n>fake` tags for unnamed aggregates; they are
/// kept as [`Tag::Anonymous`] so that a real tag that happens to look similar
/// is never mistaken for one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Named(String),
    Anonymous(u32),
    /// Disambiguated tag, rendered as `<base>_duplicate_<category><index>`.
    Duplicate {
        base: Box<Tag>,
        category: char,
        index: usize,
    },
}

impl Tag {
    /// Classify an already sanitized tag.
    pub fn from_sanitized(tag: &str) -> Self {
        tag.strip_prefix('_')
            .and_then(|rest| rest.strip_suffix("fake"))
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .map(Tag::Anonymous)
            .unwrap_or_else(|| Tag::Named(tag.to_string()))
    }

    pub fn is_anonymous(&self) -> bool {
        match self {
            Tag::Named(_) => false,
            Tag::Anonymous(_) => true,
            Tag::Duplicate { base, .. } => base.is_anonymous(),
        }
    }

    /// Wrap this tag as the `index`-th member of a colliding set.
    pub fn duplicate(&self, category: char, index: usize) -> Self {
        Tag::Duplicate {
            base: Box::new(self.clone()),
            category,
            index,
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Named(name) => f.write_str(name),
            Tag::Anonymous(n) => write!(f, "_{n}fake"),
            Tag::Duplicate {
                base,
                category,
                index,
            } => write!(f, "{base}_duplicate_{category}{index}"),
        }
    }
}

/// Whether a [`RecordType`] is a struct or a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Struct,
    Union,
}

impl RecordKind {
    pub fn keyword(self) -> &'static str {
        match self {
            RecordKind::Struct => "struct",
            RecordKind::Union => "union",
        }
    }

    /// Letter used when disambiguating colliding tags.
    pub fn letter(self) -> char {
        match self {
            RecordKind::Struct => 's',
            RecordKind::Union => 'u',
        }
    }

    pub fn type_of(self, id: RecordId) -> Type {
        match self {
            RecordKind::Struct => Type::Struct(id),
            RecordKind::Union => Type::Union(id),
        }
    }
}

/// A field of a struct or union.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Byte offset, or bit offset for bitfields.
    pub offset: u32,
    /// Size in bytes, or width in bits for bitfields.
    pub size: u32,
    pub bitfield: bool,
    pub name: String,
    pub ty: Type,
}

/// Struct or union definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub kind: RecordKind,
    pub tag: Tag,
    /// Size in bytes; `0` until the defining sequence has been seen.
    pub size: u32,
    pub fields: Vec<Field>,
    /// Typedefs naming this type (directly or through a pointer).
    pub aliases: Vec<TypedefId>,
    /// Set when some declaration uses the type by value.
    pub value_uses: bool,
    /// Set when some declaration reaches the type through a pointer.
    pub pointer_uses: bool,
}

impl RecordType {
    pub fn new(kind: RecordKind, tag: Tag, size: u32) -> Self {
        Self {
            kind,
            tag,
            size,
            fields: Vec::new(),
            aliases: Vec::new(),
            value_uses: false,
            pointer_uses: false,
        }
    }

    /// Only ever reached through pointers.
    pub fn reference_only(&self) -> bool {
        self.pointer_uses && !self.value_uses
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub value: i32,
    pub name: String,
}

/// Enum definition. Members are kept in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub tag: Tag,
    pub members: Vec<EnumMember>,
    pub aliases: Vec<TypedefId>,
}

impl EnumType {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            members: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Members ordered by `(value, name)`.
    pub fn sorted_members(&self) -> Vec<&EnumMember> {
        let mut members: Vec<_> = self.members.iter().collect();
        members.sort_by(|a, b| a.value.cmp(&b.value).then_with(|| a.name.cmp(&b.name)));
        members
    }
}
