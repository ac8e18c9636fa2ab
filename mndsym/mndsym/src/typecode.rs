//! Mapping from COFF type words to the C type model.

use mndsym_core::{BaseKind, Type};
use mndsym_tags::{BaseCode, Modifier};

/// Scalar C type for a base code; `None` for tagged and null bases.
pub(crate) fn scalar_kind(base: BaseCode) -> Option<BaseKind> {
    Some(match base {
        BaseCode::Void => BaseKind::Void,
        BaseCode::Char => BaseKind::Char,
        BaseCode::Short => BaseKind::Short,
        BaseCode::Int => BaseKind::Int,
        BaseCode::Long => BaseKind::Long,
        BaseCode::Float => BaseKind::Float,
        BaseCode::Double => BaseKind::Double,
        BaseCode::UChar => BaseKind::UChar,
        BaseCode::UShort => BaseKind::UShort,
        BaseCode::UInt => BaseKind::UInt,
        BaseCode::ULong => BaseKind::ULong,
        BaseCode::Null
        | BaseCode::Struct
        | BaseCode::Union
        | BaseCode::Enum
        | BaseCode::EnumMember => return None,
    })
}

/// Wrap `base` in the derived types given outermost first.
///
/// Array modifiers take their lengths from `dims` in the same outermost
/// first order, which is the order they are written in C: `[2, 3]` gives
/// `a[2][3]`. An array modifier without a dimension is unsized.
pub(crate) fn apply_modifiers(base: Type, mods: &[Modifier], dims: &[u32]) -> Type {
    let mut lens = dims.iter().copied();
    let lens: Vec<u32> = mods
        .iter()
        .filter(|m| **m == Modifier::Array)
        .map(|_| lens.next().unwrap_or(0))
        .collect();
    let mut lens = lens.into_iter().rev();

    mods.iter().rev().fold(base, |ty, m| match m {
        Modifier::Pointer => Type::pointer_to(ty),
        Modifier::Function => Type::Function(mndsym_core::FunctionType::new(ty)),
        Modifier::Array => Type::array_of(ty, lens.next().unwrap_or(0)),
    })
}

/// Whether a reference reaches its base type through a pointer.
pub(crate) fn is_pointer_use(mods: &[Modifier]) -> bool {
    mods.last() == Some(&Modifier::Pointer)
}
